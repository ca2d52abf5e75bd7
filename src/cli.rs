use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Moltbot Desktop
///
/// Runs the Moltbot gateway in the background and shows its control UI in a
/// native window with a tray icon.
///
/// If no subcommand is specified, runs 'ui' by default.
#[derive(Parser, Debug)]
#[command(name = "moltbot-desktop")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file [default: per-user config directory]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Run the gateway in development mode (NODE_ENV=development)
    #[arg(long, global = true)]
    pub dev: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the desktop app (default command)
    Ui,
    /// Supervise the gateway without a window until Ctrl+C
    Serve,
    /// Show where the gateway would be started from and whether it answers
    Status,
    /// Configuration file management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file with defaults and comments
    Init {
        /// Output path for the configuration file [default: per-user config path]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing file if it exists
        #[arg(short, long)]
        force: bool,
    },
}
