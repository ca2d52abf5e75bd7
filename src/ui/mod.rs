// Desktop shell: main window, tray icon and app lifecycle on top of the
// gateway supervisor.

mod commands;
mod host;
mod tray;
mod window;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tauri::{AppHandle, Manager, RunEvent};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::bridge::Bridge;
use crate::config::DesktopConfig;
use crate::gateway::{
    GatewayStatus, Supervisor, SupervisorEvent, SupervisorHandle, SupervisorOptions, describe_exit,
};
use crate::settings::SettingsStore;

use host::TauriHost;

/// Shared app state, managed by Tauri
pub struct DesktopState {
    config: DesktopConfig,
    gateway: SupervisorHandle,
    bridge: Bridge<TauriHost>,
    settings: Mutex<SettingsStore>,
    dev_mode: bool,
    /// Set once the user asked to quit; closing the window then really closes it
    quitting: AtomicBool,
    shutdown_started: AtomicBool,
    /// Set once the gateway has been shut down and the app may exit
    exit_ready: AtomicBool,
}

impl DesktopState {
    fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::SeqCst)
    }
}

/// Launch the desktop app; returns when the app exits
pub fn run(config: DesktopConfig, dev_mode: bool) -> anyhow::Result<()> {
    let app = tauri::Builder::default()
        // Must be registered first so a second launch exits before doing anything
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            tracing::info!("Second instance launched, focusing existing window");
            window::show_main(app);
        }))
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(move |app| {
            let options = SupervisorOptions {
                dev_mode,
                resources_dir: app.path().resource_dir().ok(),
            };
            let (supervisor, gateway) = Supervisor::new(config.clone(), options)?;
            tauri::async_runtime::spawn(supervisor.run());

            let settings = SettingsStore::open_default()?;
            let bridge = Bridge::new(gateway.clone(), TauriHost::new(app.handle().clone()))
                .with_version(app.package_info().version.to_string());

            app.manage(DesktopState {
                config,
                gateway,
                bridge,
                settings: Mutex::new(settings),
                dev_mode,
                quitting: AtomicBool::new(false),
                shutdown_started: AtomicBool::new(false),
                exit_ready: AtomicBool::new(false),
            });

            tauri::async_runtime::spawn(startup(app.handle().clone()));

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![commands::bridge_invoke])
        .build(tauri::generate_context!())
        .map_err(|e| anyhow::anyhow!("Failed to build UI: {}", e))?;

    app.run(|app, event| match event {
        RunEvent::ExitRequested { api, code, .. } => on_exit_requested(app, api, code),
        #[cfg(target_os = "macos")]
        RunEvent::Reopen { .. } => window::show_main(app),
        _ => {}
    });

    Ok(())
}

/// Start the gateway, then show the UI; a failed start is fatal
async fn startup(app: AppHandle) {
    let gateway = app.state::<DesktopState>().gateway.clone();
    // Subscribe before starting so a crash right after startup is still reported
    let events = gateway.subscribe();

    tracing::info!("Starting gateway...");
    if let Err(e) = gateway.start().await {
        tracing::error!("Gateway failed to start: {}", e);
        let exit_app = app.clone();
        app.dialog()
            .message(format!("Failed to start the Moltbot gateway:\n\n{}", e))
            .title("Moltbot")
            .kind(MessageDialogKind::Error)
            .show(move |_| exit_app.exit(1));
        return;
    }

    let ui_app = app.clone();
    let created = app.run_on_main_thread(move || {
        if let Err(e) = create_ui(&ui_app) {
            tracing::error!("Failed to create window: {:#}", e);
            ui_app.exit(1);
        }
    });
    if let Err(e) = created {
        tracing::error!("Failed to schedule window creation: {}", e);
        app.exit(1);
        return;
    }

    tauri::async_runtime::spawn(forward_gateway_events(app, gateway, events));
}

fn create_ui(app: &AppHandle) -> anyhow::Result<()> {
    window::create_main(app)?;
    tray::create(app)?;
    Ok(())
}

/// Reflect supervisor state in the tray and report crashes to the user
async fn forward_gateway_events(
    app: AppHandle,
    gateway: SupervisorHandle,
    mut events: broadcast::Receiver<SupervisorEvent>,
) {
    let mut status = gateway.watch_status();
    tray::update_status(&app, &gateway.status());

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current: GatewayStatus = status.borrow_and_update().clone();
                tray::update_status(&app, &current);
            }
            event = events.recv() => match event {
                Ok(SupervisorEvent::UnexpectedExit { code }) => show_error(
                    &app,
                    format!("The Moltbot gateway stopped unexpectedly ({}).", describe_exit(code)),
                ),
                Ok(SupervisorEvent::GaveUp { attempts }) => show_error(
                    &app,
                    format!(
                        "The Moltbot gateway crashed again after {} restart attempts.\n\n\
                         Use \"Restart Gateway\" from the tray menu to try again.",
                        attempts
                    ),
                ),
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }
}

fn show_error(app: &AppHandle, message: String) {
    if app.state::<DesktopState>().is_quitting() {
        return;
    }
    app.dialog()
        .message(message)
        .title("Moltbot Gateway")
        .kind(MessageDialogKind::Error)
        .show(|_| {});
}

/// Mark the app as quitting and ask Tauri to exit
///
/// The window geometry is left as last saved by a hide.
fn request_quit(app: &AppHandle) {
    let state = app.state::<DesktopState>();
    state.quitting.store(true, Ordering::SeqCst);
    app.exit(0);
}

/// Hold the first exit request until the gateway has been shut down
fn on_exit_requested(app: &AppHandle, api: tauri::ExitRequestApi, code: Option<i32>) {
    let state = app.state::<DesktopState>();

    if state.exit_ready.load(Ordering::SeqCst) {
        return;
    }

    api.prevent_exit();

    state.quitting.store(true, Ordering::SeqCst);
    if state.shutdown_started.swap(true, Ordering::SeqCst) {
        return;
    }

    let app = app.clone();
    let gateway = state.gateway.clone();
    tauri::async_runtime::spawn(async move {
        tracing::info!("Shutting down gateway before exit");
        if let Err(e) = gateway.shutdown().await {
            tracing::warn!("Gateway shutdown failed: {}", e);
        }
        app.state::<DesktopState>().exit_ready.store(true, Ordering::SeqCst);
        app.exit(code.unwrap_or(0));
    });
}
