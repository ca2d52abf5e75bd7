use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Desktop shell configuration
///
/// Every field has a default, so a missing file or a file with only a few
/// keys set is valid.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DesktopConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub health: HealthSettings,
    #[serde(default)]
    pub shutdown: ShutdownSettings,
    #[serde(default)]
    pub crash_restart: CrashRestartSettings,
    #[serde(default)]
    pub window: WindowSettings,
}

/// How the gateway process is launched
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySettings {
    /// Address the gateway binds and the window loads
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Interpreter used to run the entry point
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Explicit entry point, checked before the built-in candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<PathBuf>,

    /// Project checkout used for the development fallbacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    /// Pass --verbose to the gateway
    #[serde(default = "default_true")]
    pub verbose: bool,
}

/// Readiness polling
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthSettings {
    #[serde(default = "default_health_path")]
    pub path: String,

    /// Give up waiting for the gateway after this long
    #[serde(default = "default_health_timeout")]
    pub timeout_ms: u64,

    /// Pause between probes
    #[serde(default = "default_health_interval")]
    pub interval_ms: u64,

    /// Timeout of a single probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

/// Gateway termination
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShutdownSettings {
    /// Wait this long after SIGTERM before killing the gateway
    #[serde(default = "default_grace_period")]
    pub grace_period_ms: u64,
}

/// Automatic restart after the gateway crashes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrashRestartSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Consecutive restart attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Random delay added on top of the backoff
    #[serde(default = "default_jitter")]
    pub jitter_ms: u64,

    /// A gateway that stayed up this long starts with a fresh attempt budget
    #[serde(default = "default_reset_after")]
    pub reset_after_ms: u64,
}

/// Main window sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowSettings {
    #[serde(default = "default_width")]
    pub default_width: u32,
    #[serde(default = "default_height")]
    pub default_height: u32,
    #[serde(default = "default_min_width")]
    pub min_width: u32,
    #[serde(default = "default_min_height")]
    pub min_height: u32,
}

// Default values
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    18789
}

fn default_interpreter() -> String {
    "node".to_string()
}

fn default_true() -> bool {
    true
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_health_timeout() -> u64 {
    30_000
}

fn default_health_interval() -> u64 {
    500
}

fn default_probe_timeout() -> u64 {
    1_000
}

fn default_grace_period() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> u64 {
    1_000
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_jitter() -> u64 {
    250
}

fn default_reset_after() -> u64 {
    60_000
}

fn default_width() -> u32 {
    1400
}

fn default_height() -> u32 {
    900
}

fn default_min_width() -> u32 {
    800
}

fn default_min_height() -> u32 {
    600
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            interpreter: default_interpreter(),
            entry_point: None,
            project_root: None,
            verbose: true,
        }
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            path: default_health_path(),
            timeout_ms: default_health_timeout(),
            interval_ms: default_health_interval(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self {
            grace_period_ms: default_grace_period(),
        }
    }
}

impl Default for CrashRestartSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            jitter_ms: default_jitter(),
            reset_after_ms: default_reset_after(),
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            default_width: default_width(),
            default_height: default_height(),
            min_width: default_min_width(),
            min_height: default_min_height(),
        }
    }
}

impl GatewaySettings {
    /// Base URL the gateway serves its UI and API from
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl HealthSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl DesktopConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: DesktopConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Health endpoint of the configured gateway
    pub fn health_url(&self) -> String {
        let path = self.health.path.trim_start_matches('/');
        format!("{}/{}", self.gateway.base_url(), path)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.gateway.port == 0 {
            anyhow::bail!("Gateway port must be non-zero");
        }

        if self.gateway.interpreter.trim().is_empty() {
            anyhow::bail!("Gateway interpreter must not be empty");
        }

        url::Url::parse(&self.health_url())
            .with_context(|| format!("Invalid gateway address: {}", self.health_url()))?;

        if self.health.interval_ms == 0 || self.health.probe_timeout_ms == 0 {
            anyhow::bail!("Health interval and probe timeout must be non-zero");
        }

        if self.health.probe_timeout_ms > self.health.timeout_ms {
            anyhow::bail!(
                "Probe timeout ({}ms) must not exceed the startup timeout ({}ms)",
                self.health.probe_timeout_ms,
                self.health.timeout_ms
            );
        }

        if self.crash_restart.enabled && self.crash_restart.max_attempts == 0 {
            anyhow::bail!("crash_restart.max_attempts must be at least 1 when restarts are enabled");
        }

        if self.crash_restart.base_delay_ms > self.crash_restart.max_delay_ms {
            anyhow::bail!("crash_restart.base_delay_ms must not exceed max_delay_ms");
        }

        if self.window.min_width > self.window.default_width
            || self.window.min_height > self.window.default_height
        {
            anyhow::bail!("Minimum window size must not exceed the default size");
        }

        Ok(())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("ai", "moltbot", "moltbot-desktop")
        .context("Could not determine the user configuration directory")
}

/// Per-user directory holding config.toml and settings.json
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Default location of the config file
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Example configuration written by `config init`
pub const EXAMPLE_CONFIG: &str = r#"# Moltbot Desktop configuration
#
# Every key is optional; the values below are the defaults.

[gateway]
host = "127.0.0.1"
port = 18789
interpreter = "node"
verbose = true
# entry_point = "/path/to/moltbot/dist/index.js"
# project_root = "/path/to/moltbot"

[health]
path = "/health"
timeout_ms = 30000
interval_ms = 500
probe_timeout_ms = 1000

[shutdown]
grace_period_ms = 5000

[crash_restart]
enabled = true
max_attempts = 5
base_delay_ms = 1000
max_delay_ms = 30000
jitter_ms = 250
reset_after_ms = 60000

[window]
default_width = 1400
default_height = 900
min_width = 800
min_height = 600
"#;
