use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::broadcast::{self, error::RecvError};

use super::utils::{init_logging, load_config};
use crate::gateway::{Supervisor, SupervisorEvent, SupervisorOptions, describe_exit};

/// Supervise the gateway without a window until Ctrl+C
pub fn serve(config: Option<PathBuf>, dev: bool, verbose: bool) -> Result<()> {
    init_logging(verbose);

    let (config_path, config) = load_config(config)?;
    tracing::debug!("Using configuration from {}", config_path.display());

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let options = SupervisorOptions {
            dev_mode: dev,
            resources_dir: None,
        };
        let (supervisor, handle) = Supervisor::new(config, options)?;
        let control = tokio::spawn(supervisor.run());
        let events = handle.subscribe();

        handle.start().await.context("Failed to start gateway")?;

        let status = handle.status();
        println!("✓ Gateway running at {}", status.url);
        println!("Press Ctrl+C to stop");

        let result = watch_until_interrupted(events).await;

        println!("Stopping gateway...");
        let outcome = handle.shutdown().await?;
        tracing::info!("Gateway shutdown: {:?}", outcome);

        drop(handle);
        control.await.context("Supervisor task panicked")?;

        result
    })
}

/// Log supervisor events until Ctrl+C; fails if the supervisor gives up
async fn watch_until_interrupted(mut events: broadcast::Receiver<SupervisorEvent>) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal.context("Failed to listen for Ctrl+C")?;
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(SupervisorEvent::UnexpectedExit { code }) => {
                    eprintln!("Gateway exited unexpectedly ({})", describe_exit(code));
                }
                Ok(SupervisorEvent::GaveUp { attempts }) => {
                    anyhow::bail!("Gateway crashed {} times in a row, giving up", attempts + 1);
                }
                Ok(SupervisorEvent::Started { pid }) => tracing::info!("Gateway started (pid {})", pid),
                Ok(SupervisorEvent::Stopped { outcome }) => {
                    tracing::debug!("Gateway stopped: {:?}", outcome);
                }
                Ok(SupervisorEvent::RestartScheduled { attempt, delay }) => {
                    tracing::info!("Restart attempt {} in {:?}", attempt, delay);
                }
                Ok(SupervisorEvent::RestartFailed { attempt, error }) => {
                    tracing::warn!("Restart attempt {} failed: {}", attempt, error);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Missed {} supervisor events", skipped);
                }
                Err(RecvError::Closed) => anyhow::bail!("Gateway supervisor stopped"),
            },
        }
    }
}
