use anyhow::{Context, Result};
use std::path::PathBuf;

use super::utils::{init_logging, load_config};
use crate::gateway::{
    EntryPointSearch, GatewayError, HealthPoller, ProbeOutcome, default_resources_dir,
};

/// Show where the gateway would be launched from and whether it answers
pub fn status(config: Option<PathBuf>, verbose: bool) -> Result<()> {
    init_logging(verbose);

    let (config_path, config) = load_config(config)?;

    println!("Moltbot Desktop Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Config:       {}{}",
        config_path.display(),
        if config_path.exists() { "" } else { " (not found, using defaults)" }
    );
    println!("Interpreter:  {}", config.gateway.interpreter);

    let search = EntryPointSearch::from_settings(&config.gateway, default_resources_dir());
    match search.resolve() {
        Ok(entry_point) => println!("Entry point:  {}", entry_point.display()),
        Err(GatewayError::NotFound { candidates }) => {
            println!("Entry point:  NOT FOUND");
            for candidate in candidates {
                println!("  looked in:  {}", candidate.display());
            }
        }
        Err(e) => return Err(e.into()),
    }

    println!("Gateway URL:  {}", config.gateway.base_url());

    let health_url = config.health_url();
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let outcome = runtime.block_on(async {
        let poller = HealthPoller::new(&config.health)?;
        Ok::<_, anyhow::Error>(poller.probe(&health_url).await)
    })?;

    match outcome {
        ProbeOutcome::Ready => println!("Health:       ✓ responding"),
        ProbeOutcome::NotReady(reason) => println!("Health:       ✗ not responding ({})", reason),
    }

    Ok(())
}
