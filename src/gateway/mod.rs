// Gateway supervision
//
// Launches the Moltbot gateway as a child process, waits for its health
// endpoint, restarts it after crashes and stops it on quit. All lifecycle
// transitions run on one control task (see `supervisor`).

mod health;
mod launch;
mod process;
mod restart;
mod supervisor;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::PathBuf;
use std::time::Duration;

pub use health::{HealthPoller, ProbeOutcome};
pub use launch::{EntryPointSearch, LaunchPlan, default_resources_dir};
pub use supervisor::{Supervisor, SupervisorEvent, SupervisorHandle, SupervisorOptions};

#[cfg(feature = "ui")]
pub use supervisor::GatewayStatus;

/// Failures of the gateway lifecycle
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Could not find the gateway entry point (looked in: {})", list_paths(.candidates))]
    NotFound { candidates: Vec<PathBuf> },

    #[error("Failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Gateway did not respond within {} seconds ({attempts} probes)", .timeout.as_secs_f64())]
    Timeout { timeout: Duration, attempts: u32 },

    #[error("Gateway exited during startup ({})", exit_suffix(.code))]
    ExitedDuringStartup { code: Option<i32> },

    #[error("Gateway is shutting down")]
    ShuttingDown,

    #[error("Gateway supervisor is no longer running")]
    SupervisorGone,
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn exit_suffix(code: &Option<i32>) -> String {
    describe_exit(*code)
}

/// Human-readable exit code, `None` meaning the process was killed by a signal
pub fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code: {}", code),
        None => "terminated by signal".to_string(),
    }
}
