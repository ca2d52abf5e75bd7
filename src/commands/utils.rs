use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::{self, DesktopConfig};

/// Initialize logging
///
/// `RUST_LOG` wins when set; gateway output can be filtered on its own with
/// e.g. `RUST_LOG=info,gateway=warn`.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

/// Config file to use: `--config` if given, else the per-user default
pub fn resolve_config_path(config: Option<PathBuf>) -> Result<PathBuf> {
    match config {
        Some(path) => Ok(path),
        None => config::get_config_path(),
    }
}

/// Load the desktop config; a missing file means defaults
pub fn load_config(config: Option<PathBuf>) -> Result<(PathBuf, DesktopConfig)> {
    let path = resolve_config_path(config)?;
    let config = DesktopConfig::load_or_default(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    Ok((path, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(PathBuf::from("/etc/moltbot.toml"))).unwrap();

        assert_eq!(path, PathBuf::from("/etc/moltbot.toml"));
    }

    #[test]
    fn load_config_uses_defaults_for_missing_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");

        let (loaded_from, config) = load_config(Some(path.clone())).unwrap();

        assert_eq!(loaded_from, path);
        assert_eq!(config.gateway.port, 18789);
    }

    #[test]
    fn load_config_reports_invalid_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[gateway]\nport = 0\n").unwrap();

        let err = load_config(Some(path)).unwrap_err();

        assert!(format!("{:#}", err).contains("port"));
    }
}
