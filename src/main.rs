use anyhow::Result;
use clap::Parser;

// Driven by the desktop UI only
#[cfg_attr(not(feature = "ui"), allow(dead_code, unused_imports))]
mod bridge;
mod cli;
mod commands;
mod config;
mod gateway;
mod platform;
#[cfg_attr(not(feature = "ui"), allow(dead_code))]
mod settings;
#[cfg(feature = "ui")]
mod ui;

use cli::{Args, Commands, ConfigCommands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Ui) | None => run_ui(args.config, args.dev, args.verbose),
        Some(Commands::Serve) => commands::serve(args.config, args.dev, args.verbose),
        Some(Commands::Status) => commands::status(args.config, args.verbose),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Init { output, force } => commands::config::init(output, force),
        },
    }
}

#[cfg(feature = "ui")]
fn run_ui(config: Option<std::path::PathBuf>, dev: bool, verbose: bool) -> Result<()> {
    commands::utils::init_logging(verbose);
    let (config_path, config) = commands::utils::load_config(config)?;
    tracing::debug!("Using configuration from {}", config_path.display());

    ui::run(config, dev)
}

#[cfg(not(feature = "ui"))]
fn run_ui(_config: Option<std::path::PathBuf>, _dev: bool, _verbose: bool) -> Result<()> {
    anyhow::bail!(
        "This build has no desktop UI. Rebuild with `--features ui`, \
         or use `moltbot-desktop serve` to run the gateway headless."
    )
}
