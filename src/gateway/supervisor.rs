use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;

use super::health::HealthPoller;
use super::launch::{EntryPointSearch, LaunchPlan, default_resources_dir};
use super::process::{GatewayProcess, StopOutcome};
use super::restart::{RestartDecision, RestartPolicy};
use super::{GatewayError, describe_exit};
use crate::config::DesktopConfig;

/// Lifecycle state published by the supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GatewayState {
    Stopped,
    Starting,
    Running,
    Stopping,
    #[serde(rename_all = "camelCase")]
    CrashedRestarting { attempt: u32, retry_in_ms: u64 },
    GaveUp { attempts: u32 },
}

impl GatewayState {
    /// One-line description for the tray menu
    #[cfg_attr(not(feature = "ui"), allow(dead_code))]
    pub fn label(&self) -> String {
        match self {
            Self::Running => "● Running".to_string(),
            Self::Stopped => "○ Stopped".to_string(),
            Self::Starting => "○ Starting…".to_string(),
            Self::Stopping => "○ Stopping…".to_string(),
            Self::CrashedRestarting { attempt, .. } => format!("○ Restarting (attempt {})", attempt),
            Self::GaveUp { .. } => "○ Stopped (crashed)".to_string(),
        }
    }
}

/// Snapshot of the gateway for the tray, the bridge and `status`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub running: bool,
    pub port: u16,
    pub url: String,
    pub state: GatewayState,
    pub pid: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_exit_code: Option<i32>,
}

/// Notifications for whoever presents the gateway to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    Started { pid: u32 },
    Stopped { outcome: StopOutcome },
    /// The gateway died while nobody asked it to stop
    UnexpectedExit { code: Option<i32> },
    RestartScheduled { attempt: u32, delay: Duration },
    RestartFailed { attempt: u32, error: String },
    GaveUp { attempts: u32 },
}

/// Runtime inputs that do not live in the config file
#[derive(Debug, Clone, Default)]
pub struct SupervisorOptions {
    /// Launch the gateway with NODE_ENV=development
    pub dev_mode: bool,
    /// Packaged resources directory; defaults to the executable's directory
    pub resources_dir: Option<PathBuf>,
}

enum Command {
    Start(oneshot::Sender<Result<(), GatewayError>>),
    Stop(oneshot::Sender<StopOutcome>),
    Restart(oneshot::Sender<Result<(), GatewayError>>),
    Shutdown(oneshot::Sender<StopOutcome>),
}

/// Cloneable front door to the supervisor's control task
#[derive(Clone)]
pub struct SupervisorHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<GatewayStatus>,
    events: broadcast::Sender<SupervisorEvent>,
}

impl SupervisorHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, GatewayError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| GatewayError::SupervisorGone)?;
        response.await.map_err(|_| GatewayError::SupervisorGone)
    }

    /// Start the gateway and wait until it is healthy; no-op when running
    pub async fn start(&self) -> Result<(), GatewayError> {
        self.request(Command::Start).await?
    }

    /// Stop the gateway; no-op when stopped
    ///
    /// The shell itself only restarts or shuts down.
    #[allow(dead_code)]
    pub async fn stop(&self) -> Result<StopOutcome, GatewayError> {
        self.request(Command::Stop).await
    }

    /// Stop, then start again
    #[cfg_attr(not(feature = "ui"), allow(dead_code))]
    pub async fn restart(&self) -> Result<(), GatewayError> {
        self.request(Command::Restart).await?
    }

    /// Stop for good: later exits are never treated as crashes
    pub async fn shutdown(&self) -> Result<StopOutcome, GatewayError> {
        self.request(Command::Shutdown).await
    }

    /// Current status without waiting on the control task
    pub fn status(&self) -> GatewayStatus {
        self.status.borrow().clone()
    }

    /// Receiver that wakes on every status change
    #[cfg_attr(not(feature = "ui"), allow(dead_code))]
    pub fn watch_status(&self) -> watch::Receiver<GatewayStatus> {
        self.status.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.events.subscribe()
    }
}

/// Owner of the gateway process
///
/// Runs as a single task: commands, crash detection and scheduled restarts
/// are all handled in one `select!` loop, so two lifecycle transitions can
/// never overlap and at most one gateway process exists at a time.
pub struct Supervisor {
    config: DesktopConfig,
    search: EntryPointSearch,
    dev_mode: bool,
    poller: HealthPoller,
    policy: RestartPolicy,
    process: Option<GatewayProcess>,
    pending_restart: Option<Instant>,
    quitting: bool,
    commands: mpsc::Receiver<Command>,
    status: watch::Sender<GatewayStatus>,
    events: broadcast::Sender<SupervisorEvent>,
}

impl Supervisor {
    /// Build the supervisor and its handle; drive it with [`Supervisor::run`]
    pub fn new(
        config: DesktopConfig,
        options: SupervisorOptions,
    ) -> anyhow::Result<(Self, SupervisorHandle)> {
        config.validate()?;

        let resources_dir = options.resources_dir.or_else(default_resources_dir);
        let search = EntryPointSearch::from_settings(&config.gateway, resources_dir);
        let poller = HealthPoller::new(&config.health)?;
        let policy = RestartPolicy::new(config.crash_restart.clone());

        let (command_tx, command_rx) = mpsc::channel(16);
        let (status_tx, status_rx) = watch::channel(GatewayStatus {
            running: false,
            port: config.gateway.port,
            url: config.gateway.base_url(),
            state: GatewayState::Stopped,
            pid: None,
            started_at: None,
            last_exit_code: None,
        });
        let (event_tx, _) = broadcast::channel(64);

        let handle = SupervisorHandle {
            commands: command_tx,
            status: status_rx,
            events: event_tx.clone(),
        };

        let supervisor = Self {
            config,
            search,
            dev_mode: options.dev_mode,
            poller,
            policy,
            process: None,
            pending_restart: None,
            quitting: false,
            commands: command_rx,
            status: status_tx,
            events: event_tx,
        };

        Ok((supervisor, handle))
    }

    /// Control loop; returns once every handle is dropped
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                code = wait_for_exit(&mut self.process) => self.on_unexpected_exit(code),
                _ = wait_until(self.pending_restart) => self.run_scheduled_restart().await,
            }
        }

        tracing::debug!("Supervisor handles dropped, stopping gateway");
        self.quitting = true;
        self.stop().await;
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start(reply) => {
                self.pending_restart = None;
                self.policy.reset();
                let _ = reply.send(self.start().await);
            }
            Command::Stop(reply) => {
                let _ = reply.send(self.stop().await);
            }
            Command::Restart(reply) => {
                tracing::info!("Restarting gateway");
                self.stop().await;
                self.policy.reset();
                let _ = reply.send(self.start().await);
            }
            Command::Shutdown(reply) => {
                self.quitting = true;
                let _ = reply.send(self.stop().await);
            }
        }
    }

    async fn start(&mut self) -> Result<(), GatewayError> {
        if let Some(process) = &self.process {
            tracing::info!("Gateway already running (pid {})", process.pid());
            return Ok(());
        }

        if self.quitting {
            return Err(GatewayError::ShuttingDown);
        }

        self.publish(GatewayState::Starting);

        let result = self.launch().await;
        match result {
            Ok(process) => {
                let pid = process.pid();
                self.process = Some(process);
                self.status.send_modify(|status| {
                    status.started_at = Some(Utc::now());
                });
                self.publish(GatewayState::Running);
                self.emit(SupervisorEvent::Started { pid });
                tracing::info!("Gateway is ready at {}", self.config.gateway.base_url());
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to start gateway: {}", e);
                self.publish(GatewayState::Stopped);
                Err(e)
            }
        }
    }

    /// Spawn the gateway and wait for its health endpoint, watching for an
    /// early exit while waiting
    async fn launch(&self) -> Result<GatewayProcess, GatewayError> {
        let entry_point = self.search.resolve()?;
        tracing::info!("Starting gateway from: {}", entry_point.display());

        let plan = LaunchPlan::new(&self.config.gateway, entry_point, self.dev_mode);
        let mut process = GatewayProcess::spawn(&plan)?;

        let health_url = self.config.health_url();
        let ready = tokio::select! {
            ready = self.poller.wait_for_ready(&health_url) => ready.map(|_| ()),
            code = process.wait() => Err(GatewayError::ExitedDuringStartup { code }),
        };

        match ready {
            Ok(()) => Ok(process),
            Err(e @ GatewayError::ExitedDuringStartup { .. }) => Err(e),
            Err(e) => {
                process.terminate(self.grace_period()).await;
                Err(e)
            }
        }
    }

    async fn stop(&mut self) -> StopOutcome {
        self.pending_restart = None;

        let Some(process) = self.process.take() else {
            // Cancels a pending crash restart or clears GaveUp
            if self.status.borrow().state != GatewayState::Stopped {
                self.publish(GatewayState::Stopped);
            }
            return StopOutcome::AlreadyStopped;
        };

        tracing::info!("Stopping gateway (pid {})", process.pid());
        self.publish(GatewayState::Stopping);

        let (outcome, code) = process.terminate(self.grace_period()).await;

        self.status.send_modify(|status| status.last_exit_code = code);
        self.publish(GatewayState::Stopped);
        self.emit(SupervisorEvent::Stopped { outcome });

        outcome
    }

    /// Exit observed outside of `stop()`: the gateway crashed
    fn on_unexpected_exit(&mut self, code: Option<i32>) {
        let uptime = self.process.take().map(|process| process.uptime());

        tracing::warn!("Gateway process exited ({})", describe_exit(code));
        self.status.send_modify(|status| status.last_exit_code = code);
        self.publish(GatewayState::Stopped);

        if self.quitting {
            return;
        }

        self.emit(SupervisorEvent::UnexpectedExit { code });
        let decision = self.policy.on_crash(uptime);
        self.apply(decision);
    }

    async fn run_scheduled_restart(&mut self) {
        self.pending_restart = None;
        let attempt = self.policy.attempts();

        tracing::info!("Restarting gateway after crash (attempt {})", attempt);

        if let Err(e) = self.start().await {
            self.emit(SupervisorEvent::RestartFailed {
                attempt,
                error: e.to_string(),
            });
            let decision = self.policy.on_crash(None);
            self.apply(decision);
        }
    }

    fn apply(&mut self, decision: RestartDecision) {
        match decision {
            RestartDecision::RetryAfter { attempt, delay } => {
                tracing::info!(
                    "Scheduling gateway restart in {} ms (attempt {}/{})",
                    delay.as_millis(),
                    attempt,
                    self.config.crash_restart.max_attempts
                );
                self.pending_restart = Some(Instant::now() + delay);
                self.publish(GatewayState::CrashedRestarting {
                    attempt,
                    retry_in_ms: delay.as_millis() as u64,
                });
                self.emit(SupervisorEvent::RestartScheduled { attempt, delay });
            }
            RestartDecision::GiveUp { attempts } => {
                tracing::error!("Gateway keeps crashing, giving up after {} restarts", attempts);
                self.publish(GatewayState::GaveUp { attempts });
                self.emit(SupervisorEvent::GaveUp { attempts });
            }
            RestartDecision::Disabled => {
                tracing::info!("Automatic gateway restart is disabled");
            }
        }
    }

    fn grace_period(&self) -> Duration {
        Duration::from_millis(self.config.shutdown.grace_period_ms)
    }

    fn publish(&self, state: GatewayState) {
        let pid = self.process.as_ref().map(GatewayProcess::pid);
        self.status.send_modify(|status| {
            status.running = state == GatewayState::Running;
            status.pid = pid;
            if pid.is_none() {
                status.started_at = None;
            }
            status.state = state;
        });
    }

    fn emit(&self, event: SupervisorEvent) {
        // No subscribers is fine (headless mode without a UI)
        let _ = self.events.send(event);
    }
}

async fn wait_for_exit(process: &mut Option<GatewayProcess>) -> Option<i32> {
    match process {
        Some(process) => process.wait().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;

    #[test]
    fn state_labels_mark_only_running_as_up() {
        assert_eq!(GatewayState::Running.label(), "● Running");
        assert_eq!(GatewayState::Stopped.label(), "○ Stopped");
        assert_eq!(
            GatewayState::CrashedRestarting {
                attempt: 2,
                retry_in_ms: 2_000
            }
            .label(),
            "○ Restarting (attempt 2)"
        );
    }

    #[test]
    fn state_serializes_with_kind_tag() {
        let json = serde_json::to_value(GatewayState::CrashedRestarting {
            attempt: 1,
            retry_in_ms: 1_250,
        })
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "kind": "crashedRestarting", "attempt": 1, "retryInMs": 1250 })
        );
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::gateway::test_support::{HealthServer, closed_port, script_config, write_script};
    use crate::platform::unix::process_exists;

    const LONG_RUNNING: &str = "exec sleep 30\n";

    fn spawn_supervisor(config: DesktopConfig, resources: &std::path::Path) -> SupervisorHandle {
        let options = SupervisorOptions {
            dev_mode: false,
            resources_dir: Some(resources.to_path_buf()),
        };
        let (supervisor, handle) = Supervisor::new(config, options).unwrap();
        tokio::spawn(supervisor.run());
        handle
    }

    async fn next_event(events: &mut broadcast::Receiver<SupervisorEvent>) -> SupervisorEvent {
        tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("timed out waiting for supervisor event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn start_runs_gateway_until_healthy() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(2).await;
        let script = write_script(temp.path(), "gateway.sh", LONG_RUNNING);
        let handle = spawn_supervisor(script_config(server.port(), script, temp.path()), temp.path());

        handle.start().await.unwrap();

        let status = handle.status();
        assert!(status.running);
        assert_eq!(status.state, GatewayState::Running);
        assert_eq!(status.port, server.port());
        assert!(status.pid.is_some_and(process_exists));
        assert!(status.started_at.is_some());
        assert!(server.hits() >= 3);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn start_twice_keeps_single_process() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(0).await;
        let script = write_script(temp.path(), "gateway.sh", LONG_RUNNING);
        let handle = spawn_supervisor(script_config(server.port(), script, temp.path()), temp.path());

        handle.start().await.unwrap();
        let first = handle.status().pid;
        handle.start().await.unwrap();

        assert_eq!(handle.status().pid, first);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn stop_on_stopped_supervisor_is_noop() {
        let temp = tempfile::tempdir().unwrap();
        let script = write_script(temp.path(), "gateway.sh", LONG_RUNNING);
        let handle = spawn_supervisor(script_config(closed_port().await, script, temp.path()), temp.path());
        let mut events = handle.subscribe();

        let outcome = handle.stop().await.unwrap();

        assert_eq!(outcome, StopOutcome::AlreadyStopped);
        assert_eq!(handle.status().state, GatewayState::Stopped);
        assert!(handle.status().pid.is_none());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_terminates_gateway_gracefully() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(0).await;
        let script = write_script(temp.path(), "gateway.sh", LONG_RUNNING);
        let handle = spawn_supervisor(script_config(server.port(), script, temp.path()), temp.path());

        handle.start().await.unwrap();
        let pid = handle.status().pid.unwrap();

        let outcome = handle.stop().await.unwrap();

        assert_eq!(outcome, StopOutcome::Graceful);
        assert!(!process_exists(pid));
        assert!(!handle.status().running);
    }

    #[tokio::test]
    async fn stop_forces_kill_exactly_once_when_sigterm_ignored() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(0).await;
        let script = write_script(
            temp.path(),
            "gateway.sh",
            "trap '' TERM\nwhile :; do sleep 0.05; done\n",
        );
        let handle = spawn_supervisor(script_config(server.port(), script, temp.path()), temp.path());
        let mut events = handle.subscribe();

        handle.start().await.unwrap();
        let pid = handle.status().pid.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let outcome = handle.stop().await.unwrap();

        assert_eq!(outcome, StopOutcome::Forced);
        assert!(!process_exists(pid));
        assert!(matches!(next_event(&mut events).await, SupervisorEvent::Started { .. }));
        assert_eq!(
            next_event(&mut events).await,
            SupervisorEvent::Stopped {
                outcome: StopOutcome::Forced
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn restart_leaves_exactly_one_new_process() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(0).await;
        let script = write_script(temp.path(), "gateway.sh", LONG_RUNNING);
        let handle = spawn_supervisor(script_config(server.port(), script, temp.path()), temp.path());

        handle.start().await.unwrap();
        let old_pid = handle.status().pid.unwrap();

        handle.restart().await.unwrap();
        let new_pid = handle.status().pid.unwrap();

        assert_ne!(old_pid, new_pid);
        assert!(!process_exists(old_pid));
        assert!(process_exists(new_pid));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn start_fails_with_not_found_and_spawns_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(0).await;
        let mut config = script_config(server.port(), temp.path().join("missing.js"), temp.path());
        config.gateway.entry_point = None;
        let handle = spawn_supervisor(config, &temp.path().join("resources"));

        let result = handle.start().await;

        match result {
            Err(GatewayError::NotFound { candidates }) => assert_eq!(candidates.len(), 3),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(handle.status().state, GatewayState::Stopped);
        assert!(handle.status().pid.is_none());
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn start_fails_when_gateway_exits_during_startup() {
        let temp = tempfile::tempdir().unwrap();
        let script = write_script(temp.path(), "gateway.sh", "exit 3\n");
        let handle = spawn_supervisor(script_config(closed_port().await, script, temp.path()), temp.path());

        let result = handle.start().await;

        assert!(matches!(result, Err(GatewayError::ExitedDuringStartup { code: Some(3) })));
        assert!(!handle.status().running);
    }

    #[tokio::test]
    async fn start_times_out_and_kills_unhealthy_gateway() {
        let temp = tempfile::tempdir().unwrap();
        let pid_file = temp.path().join("pid");
        let script = write_script(
            temp.path(),
            "gateway.sh",
            &format!("echo $$ > '{}'\nexec sleep 30\n", pid_file.display()),
        );
        let mut config = script_config(closed_port().await, script, temp.path());
        config.health.timeout_ms = 300;
        let handle = spawn_supervisor(config, temp.path());

        let result = handle.start().await;

        assert!(matches!(result, Err(GatewayError::Timeout { .. })));
        let pid: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        assert!(!process_exists(pid));
        assert_eq!(handle.status().state, GatewayState::Stopped);
    }

    #[tokio::test]
    async fn crash_triggers_notification_and_one_restart() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(0).await;
        let marker = temp.path().join("crashed-once");
        let script = write_script(
            temp.path(),
            "gateway.sh",
            &format!(
                "if [ -f '{m}' ]; then exec sleep 30; fi\ntouch '{m}'\nsleep 0.3\nexit 1\n",
                m = marker.display()
            ),
        );
        let handle = spawn_supervisor(script_config(server.port(), script, temp.path()), temp.path());
        let mut events = handle.subscribe();

        handle.start().await.unwrap();
        let first_pid = handle.status().pid.unwrap();

        assert_eq!(next_event(&mut events).await, SupervisorEvent::Started { pid: first_pid });
        assert_eq!(
            next_event(&mut events).await,
            SupervisorEvent::UnexpectedExit { code: Some(1) }
        );
        assert!(matches!(
            next_event(&mut events).await,
            SupervisorEvent::RestartScheduled { attempt: 1, .. }
        ));
        let SupervisorEvent::Started { pid: second_pid } = next_event(&mut events).await else {
            panic!("expected the gateway to be started again");
        };

        assert_ne!(first_pid, second_pid);
        assert_eq!(handle.status().state, GatewayState::Running);

        // Nothing else happens while the restarted gateway stays up
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(events.try_recv().is_err());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn early_subscriber_keeps_crash_reported_while_busy() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(0).await;
        let marker = temp.path().join("crashed-once");
        let script = write_script(
            temp.path(),
            "gateway.sh",
            &format!(
                "if [ -f '{m}' ]; then exec sleep 30; fi\ntouch '{m}'\nsleep 0.3\nexit 3\n",
                m = marker.display()
            ),
        );
        let handle = spawn_supervisor(script_config(server.port(), script, temp.path()), temp.path());
        let mut events = handle.subscribe();

        handle.start().await.unwrap();
        let first_pid = handle.status().pid.unwrap();

        // The crash and restart happen before anyone reads the events
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(next_event(&mut events).await, SupervisorEvent::Started { pid: first_pid });
        assert_eq!(
            next_event(&mut events).await,
            SupervisorEvent::UnexpectedExit { code: Some(3) }
        );

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn crash_loop_gives_up_after_max_attempts() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(0).await;
        let script = write_script(temp.path(), "gateway.sh", "sleep 0.2\nexit 1\n");
        let mut config = script_config(server.port(), script, temp.path());
        config.crash_restart.max_attempts = 2;
        let handle = spawn_supervisor(config, temp.path());
        let mut events = handle.subscribe();

        handle.start().await.unwrap();

        let mut scheduled = 0;
        loop {
            match next_event(&mut events).await {
                SupervisorEvent::RestartScheduled { .. } => scheduled += 1,
                SupervisorEvent::GaveUp { attempts } => {
                    assert_eq!(attempts, 2);
                    break;
                }
                _ => {}
            }
        }

        assert_eq!(scheduled, 2);
        assert_eq!(handle.status().state, GatewayState::GaveUp { attempts: 2 });
        assert!(!handle.status().running);
    }

    #[tokio::test]
    async fn shutdown_suppresses_crash_handling() {
        let temp = tempfile::tempdir().unwrap();
        let server = HealthServer::start(0).await;
        let script = write_script(temp.path(), "gateway.sh", LONG_RUNNING);
        let handle = spawn_supervisor(script_config(server.port(), script, temp.path()), temp.path());
        let mut events = handle.subscribe();

        handle.start().await.unwrap();
        handle.shutdown().await.unwrap();

        assert!(matches!(next_event(&mut events).await, SupervisorEvent::Started { .. }));
        assert!(matches!(next_event(&mut events).await, SupervisorEvent::Stopped { .. }));
        assert!(matches!(handle.start().await, Err(GatewayError::ShuttingDown)));
    }
}
