use serde::Serialize;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use super::{GatewayError, LaunchPlan};
use crate::platform;

/// How a stop request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopOutcome {
    /// Nothing was running
    AlreadyStopped,
    /// The gateway exited after the termination signal
    Graceful,
    /// The grace period ran out and the gateway was killed
    Forced,
}

/// A running gateway child process
pub struct GatewayProcess {
    child: Child,
    pid: u32,
    started: Instant,
}

impl GatewayProcess {
    /// Spawn the gateway and forward its output to the log
    pub fn spawn(plan: &LaunchPlan) -> Result<Self, GatewayError> {
        let mut command = Command::new(&plan.program);
        command
            .args(&plan.args)
            .envs(plan.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(platform::windows::CREATE_NO_WINDOW);

        let mut child = command.spawn().map_err(|source| GatewayError::Spawn {
            command: plan.command_line(),
            source,
        })?;

        // A child that has already been reaped has no id; treat as a spawn failure
        let pid = child.id().ok_or_else(|| GatewayError::Spawn {
            command: plan.command_line(),
            source: std::io::Error::other("process exited before it could be tracked"),
        })?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, false));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(stderr, true));
        }

        tracing::info!("Gateway started (pid {}): {}", pid, plan.command_line());

        Ok(Self {
            child,
            pid,
            started: Instant::now(),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wait for the process to exit and return its exit code
    ///
    /// `None` means the process was killed by a signal or could not be waited on.
    pub async fn wait(&mut self) -> Option<i32> {
        match self.child.wait().await {
            Ok(status) => status.code(),
            Err(e) => {
                tracing::warn!("Failed to wait for gateway (pid {}): {}", self.pid, e);
                None
            }
        }
    }

    /// Stop the process: termination signal, bounded wait, then a forced kill
    pub async fn terminate(mut self, grace_period: Duration) -> (StopOutcome, Option<i32>) {
        if let Ok(Some(status)) = self.child.try_wait() {
            return (StopOutcome::Graceful, status.code());
        }

        match platform::request_terminate(self.pid) {
            Ok(()) => {
                if let Ok(code) = tokio::time::timeout(grace_period, self.wait()).await {
                    tracing::info!("Gateway stopped (pid {})", self.pid);
                    return (StopOutcome::Graceful, code);
                }
                tracing::warn!(
                    "Gateway did not exit within {} ms, forcing",
                    grace_period.as_millis()
                );
            }
            Err(e) => {
                tracing::debug!("Graceful termination unavailable: {:#}", e);
            }
        }

        if let Err(e) = self.child.start_kill() {
            tracing::warn!("Failed to kill gateway (pid {}): {}", self.pid, e);
        }
        let code = self.wait().await;
        tracing::info!("Gateway killed (pid {})", self.pid);

        (StopOutcome::Forced, code)
    }
}

/// Log each line the gateway prints under the `gateway` target
async fn forward_output<R>(stream: R, is_stderr: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                if is_stderr {
                    tracing::warn!(target: "gateway", "{}", line);
                } else {
                    tracing::info!(target: "gateway", "{}", line);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Stopped reading gateway output: {}", e);
                break;
            }
        }
    }
}
