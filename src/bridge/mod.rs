// Bridge between the rendered gateway UI and the desktop host
//
// The UI can only reach the operations listed in `BridgeRequest`; anything
// else fails to deserialize before it gets here. Nothing in this module runs
// programs or touches paths chosen by the UI.

mod dialog;
mod links;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use url::Url;

use crate::gateway::{GatewayError, SupervisorHandle};

pub use dialog::{
    FileFilter, OpenDialogOptions, OpenDialogProperty, OpenDialogResult, SaveDialogOptions,
    SaveDialogResult,
};
pub use links::{Navigation, NavigationPolicy, parse_external_url};

/// One call from the UI, `{ "channel": "...", "payload": ... }` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum BridgeRequest {
    #[serde(rename = "app:getVersion")]
    GetVersion,
    #[serde(rename = "gateway:getStatus")]
    GetGatewayStatus,
    #[serde(rename = "gateway:restart")]
    RestartGateway,
    #[serde(rename = "shell:openExternal")]
    OpenExternal(String),
    #[serde(rename = "dialog:showSaveDialog")]
    ShowSaveDialog(SaveDialogOptions),
    #[serde(rename = "dialog:showOpenDialog")]
    ShowOpenDialog(OpenDialogOptions),
}

impl BridgeRequest {
    pub fn channel(&self) -> &'static str {
        match self {
            Self::GetVersion => "app:getVersion",
            Self::GetGatewayStatus => "gateway:getStatus",
            Self::RestartGateway => "gateway:restart",
            Self::OpenExternal(_) => "shell:openExternal",
            Self::ShowSaveDialog(_) => "dialog:showSaveDialog",
            Self::ShowOpenDialog(_) => "dialog:showOpenDialog",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayStatusReply {
    pub running: bool,
    pub port: u16,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartReply {
    pub success: bool,
}

/// Result of a bridge call, serialized as the bare value the UI expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    Version(String),
    GatewayStatus(GatewayStatusReply),
    Restart(RestartReply),
    SaveDialog(SaveDialogResult),
    OpenDialog(OpenDialogResult),
    /// `null`
    Done,
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Refusing to open '{scheme}:' links")]
    DisallowedScheme { scheme: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0:#}")]
    Host(anyhow::Error),
}

/// OS services the bridge needs from the GUI host
pub trait DesktopHost: Send + Sync {
    /// Open `url` with the system default handler
    fn open_external(&self, url: &Url) -> anyhow::Result<()>;

    /// Whether a main window exists to parent dialogs
    fn has_main_window(&self) -> bool;

    /// Selected path, or `None` when the user canceled
    fn show_save_dialog(
        &self,
        options: SaveDialogOptions,
    ) -> impl Future<Output = anyhow::Result<Option<PathBuf>>> + Send;

    /// Selected paths, empty when the user canceled
    fn show_open_dialog(
        &self,
        options: OpenDialogOptions,
    ) -> impl Future<Output = anyhow::Result<Vec<PathBuf>>> + Send;
}

/// Executes bridge requests against the supervisor and the host
pub struct Bridge<H> {
    gateway: SupervisorHandle,
    host: H,
    version: String,
}

impl<H: DesktopHost> Bridge<H> {
    pub fn new(gateway: SupervisorHandle, host: H) -> Self {
        Self {
            gateway,
            host,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub async fn dispatch(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        tracing::debug!("Bridge call: {}", request.channel());

        match request {
            BridgeRequest::GetVersion => Ok(BridgeResponse::Version(self.version.clone())),

            BridgeRequest::GetGatewayStatus => {
                let status = self.gateway.status();
                Ok(BridgeResponse::GatewayStatus(GatewayStatusReply {
                    running: status.running,
                    port: status.port,
                    url: status.url,
                }))
            }

            BridgeRequest::RestartGateway => {
                self.gateway.restart().await?;
                Ok(BridgeResponse::Restart(RestartReply { success: true }))
            }

            BridgeRequest::OpenExternal(raw) => {
                let url = parse_external_url(&raw)?;
                self.host.open_external(&url).map_err(BridgeError::Host)?;
                Ok(BridgeResponse::Done)
            }

            BridgeRequest::ShowSaveDialog(options) => {
                if !self.host.has_main_window() {
                    return Ok(BridgeResponse::SaveDialog(SaveDialogResult::canceled()));
                }
                let path = self
                    .host
                    .show_save_dialog(options)
                    .await
                    .map_err(BridgeError::Host)?;
                Ok(BridgeResponse::SaveDialog(SaveDialogResult::from_selection(path)))
            }

            BridgeRequest::ShowOpenDialog(options) => {
                if !self.host.has_main_window() {
                    return Ok(BridgeResponse::OpenDialog(OpenDialogResult::canceled()));
                }
                let paths = self
                    .host
                    .show_open_dialog(options)
                    .await
                    .map_err(BridgeError::Host)?;
                Ok(BridgeResponse::OpenDialog(OpenDialogResult::from_selection(paths)))
            }
        }
    }
}
