use tauri::{
    AppHandle, Manager, Wry,
    menu::{Menu, MenuItem, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
};

use super::{DesktopState, request_quit, show_error, window};
use crate::gateway::GatewayStatus;

const TRAY_ID: &str = "main";

const OPEN: &str = "open";
const STATUS_HEADER: &str = "status_header";
const STATUS: &str = "status";
const RESTART: &str = "restart_gateway";
const QUIT: &str = "quit";

/// Menu line showing the live gateway state
struct StatusItem(MenuItem<Wry>);

pub fn create(app: &AppHandle) -> tauri::Result<()> {
    let status = app.state::<DesktopState>().gateway.status();

    let open_item = MenuItem::with_id(app, OPEN, "Open Moltbot", true, None::<&str>)?;
    let header_item = MenuItem::with_id(app, STATUS_HEADER, "Gateway Status", false, None::<&str>)?;
    let status_item = MenuItem::with_id(app, STATUS, status.state.label(), false, None::<&str>)?;
    let restart_item = MenuItem::with_id(app, RESTART, "Restart Gateway", true, None::<&str>)?;
    let quit_item = MenuItem::with_id(app, QUIT, "Quit Moltbot", true, None::<&str>)?;

    let menu = Menu::with_items(
        app,
        &[
            &open_item,
            &PredefinedMenuItem::separator(app)?,
            &header_item,
            &status_item,
            &PredefinedMenuItem::separator(app)?,
            &restart_item,
            &PredefinedMenuItem::separator(app)?,
            &quit_item,
        ],
    )?;

    let mut builder = TrayIconBuilder::with_id(TRAY_ID)
        .tooltip("Moltbot")
        .menu(&menu)
        // macOS opens the menu on click; elsewhere click toggles the window
        .menu_on_left_click(cfg!(target_os = "macos"))
        .icon_as_template(cfg!(target_os = "macos"))
        .on_menu_event(|app, event| match event.id().as_ref() {
            OPEN => window::show_main(app),
            RESTART => restart_gateway(app),
            QUIT => request_quit(app),
            _ => {}
        })
        .on_tray_icon_event(|tray, event| {
            if cfg!(target_os = "macos") {
                return;
            }
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                window::toggle_main(tray.app_handle());
            }
        });

    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone());
    } else {
        tracing::warn!("No bundled icon found for the tray");
    }

    builder.build(app)?;
    app.manage(StatusItem(status_item));

    Ok(())
}

/// Refresh the status line and tooltip
pub fn update_status(app: &AppHandle, status: &GatewayStatus) {
    let label = status.state.label();

    if let Some(item) = app.try_state::<StatusItem>() {
        if let Err(e) = item.0.set_text(&label) {
            tracing::debug!("Failed to update tray status: {}", e);
        }
    }

    if let Some(tray) = app.tray_by_id(TRAY_ID) {
        let _ = tray.set_tooltip(Some(format!("Moltbot: {}", label)));
    }
}

fn restart_gateway(app: &AppHandle) {
    let app = app.clone();
    let gateway = app.state::<DesktopState>().gateway.clone();

    tauri::async_runtime::spawn(async move {
        if let Err(e) = gateway.restart().await {
            tracing::error!("Gateway restart failed: {}", e);
            show_error(&app, format!("Failed to restart the Moltbot gateway:\n\n{}", e));
        }
    });
}
