use anyhow::{Context, Result};
use tauri::webview::NewWindowResponse;
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};
use tauri_plugin_opener::OpenerExt;

use super::DesktopState;
use crate::bridge::{Navigation, NavigationPolicy};
use crate::platform;
use crate::settings::WindowBounds;
use url::Url;

pub const MAIN_WINDOW: &str = "main";

const BRIDGE_SCRIPT: &str = include_str!("bridge.js");

/// Create the main window pointed at the gateway UI, or show it if it exists
pub fn create_main(app: &AppHandle) -> Result<WebviewWindow> {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW) {
        show_main(app);
        return Ok(window);
    }

    let state = app.state::<DesktopState>();
    let gateway_url = state.config.gateway.base_url();
    let url = gateway_url
        .parse()
        .with_context(|| format!("Invalid gateway URL: {}", gateway_url))?;
    let policy = NavigationPolicy::new(&gateway_url)?;

    let bounds = state
        .settings
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .window_bounds(&state.config.window);
    let limits = &state.config.window;

    let navigation_app = app.clone();
    let navigation_policy = policy.clone();
    let new_window_app = app.clone();
    let mut builder = WebviewWindowBuilder::new(app, MAIN_WINDOW, WebviewUrl::External(url))
        .title("Moltbot")
        .inner_size(f64::from(bounds.width), f64::from(bounds.height))
        .min_inner_size(f64::from(limits.min_width), f64::from(limits.min_height))
        .visible(false)
        .initialization_script(&bridge_script())
        .on_navigation(move |url| route(&navigation_app, navigation_policy.decide(url)))
        .on_new_window(move |url, _features| {
            route(&new_window_app, policy.decide_new_window(&url));
            NewWindowResponse::Deny
        });

    if let (Some(x), Some(y)) = (bounds.x, bounds.y) {
        builder = builder.position(f64::from(x), f64::from(y));
    }

    let window = builder.build().context("Failed to create main window")?;

    let events_app = app.clone();
    window.on_window_event(move |event| {
        if let WindowEvent::CloseRequested { api, .. } = event {
            let quitting = events_app.state::<DesktopState>().is_quitting();
            if close_action(quitting) == CloseAction::Close {
                return;
            }
            save_main_bounds(&events_app);
            api.prevent_close();
            if let Some(window) = events_app.get_webview_window(MAIN_WINDOW) {
                let _ = window.hide();
            }
        }
    });

    #[cfg(debug_assertions)]
    if state.dev_mode {
        window.open_devtools();
    }

    window.show()?;
    window.set_focus()?;

    Ok(window)
}

/// Apply a navigation decision; true lets the webview load the page
fn route(app: &AppHandle, navigation: Navigation) -> bool {
    match navigation {
        Navigation::Allow => true,
        Navigation::OpenExternally(url) => {
            open_externally(app, &url);
            false
        }
        Navigation::Deny => false,
    }
}

fn open_externally(app: &AppHandle, url: &Url) {
    if let Err(e) = app.opener().open_url(url.as_str(), None::<&str>) {
        tracing::warn!("Failed to open {} externally: {}", url, e);
    }
}

/// What closing the main window does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseAction {
    /// Remember the geometry and hide to the tray
    HideToTray,
    /// Final quit: close without touching the saved geometry
    Close,
}

fn close_action(quitting: bool) -> CloseAction {
    if quitting {
        CloseAction::Close
    } else {
        CloseAction::HideToTray
    }
}

/// Bring the main window to the front
pub fn show_main(app: &AppHandle) {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW) {
        let _ = window.unminimize();
        let _ = window.show();
        let _ = window.set_focus();
    }
}

/// Hide the main window when visible, show it otherwise
pub fn toggle_main(app: &AppHandle) {
    let Some(window) = app.get_webview_window(MAIN_WINDOW) else {
        return;
    };

    if window.is_visible().unwrap_or(false) {
        save_main_bounds(app);
        let _ = window.hide();
    } else {
        show_main(app);
    }
}

/// Persist the main window geometry in the settings store
pub fn save_main_bounds(app: &AppHandle) {
    let Some(window) = app.get_webview_window(MAIN_WINDOW) else {
        return;
    };

    // Minimized and hidden windows report meaningless positions
    if window.is_minimized().unwrap_or(false) || !window.is_visible().unwrap_or(false) {
        return;
    }

    let bounds = match current_bounds(&window) {
        Ok(bounds) => bounds,
        Err(e) => {
            tracing::warn!("Failed to read window geometry: {}", e);
            return;
        }
    };

    let state = app.state::<DesktopState>();
    let mut settings = state
        .settings
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Err(e) = settings.save_window_bounds(bounds) {
        tracing::warn!("Failed to save window geometry: {:#}", e);
    }
}

fn current_bounds(window: &WebviewWindow) -> tauri::Result<WindowBounds> {
    let scale = window.scale_factor()?;
    let position = window.outer_position()?.to_logical::<i32>(scale);
    let size = window.inner_size()?.to_logical::<u32>(scale);

    Ok(WindowBounds {
        x: Some(position.x),
        y: Some(position.y),
        width: size.width,
        height: size.height,
    })
}

/// Script exposing `window.moltbotDesktop` to the gateway UI
fn bridge_script() -> String {
    BRIDGE_SCRIPT.replace("__MOLTBOT_PLATFORM__", platform::node_platform())
}
