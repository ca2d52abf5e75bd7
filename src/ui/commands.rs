use tauri::State;

use super::DesktopState;
use crate::bridge::{BridgeRequest, BridgeResponse};

/// Single entry point for `window.moltbotDesktop`
#[tauri::command]
pub async fn bridge_invoke(
    state: State<'_, DesktopState>,
    request: BridgeRequest,
) -> Result<BridgeResponse, String> {
    let channel = request.channel();

    state.bridge.dispatch(request).await.map_err(|e| {
        tracing::warn!("Bridge call {} failed: {}", channel, e);
        e.to_string()
    })
}
