use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::config::WindowSettings;
use crate::platform::common::atomic_write;

/// Key under which the main window geometry is stored
pub const WINDOW_KEY: &str = "window";

/// Saved geometry of the main window
///
/// Position is optional: on first launch the OS places the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
}

impl WindowBounds {
    pub fn default_for(settings: &WindowSettings) -> Self {
        Self {
            x: None,
            y: None,
            width: settings.default_width,
            height: settings.default_height,
        }
    }

    /// Clamp the size so a corrupted file cannot produce an unusable window
    fn clamped(self, settings: &WindowSettings) -> Self {
        Self {
            width: self.width.max(settings.min_width),
            height: self.height.max(settings.min_height),
            ..self
        }
    }
}

/// Durable JSON key-value store (`settings.json`)
///
/// Every `set` writes the whole file atomically. A missing or unreadable file
/// starts an empty store rather than failing the app.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl SettingsStore {
    /// Open the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match read_values(&path) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Ignoring unreadable settings: {:#}", e);
                Map::new()
            }
        };

        Self { path, values }
    }

    /// Open `settings.json` in the per-user config directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(get_settings_path()?))
    }

    /// Typed value for `key`; `None` when missing or of the wrong shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring malformed setting '{}': {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to serialize setting '{}'", key))?;
        self.values.insert(key.to_string(), value);
        self.save()
    }

    /// Window geometry to restore, falling back to the configured defaults
    pub fn window_bounds(&self, settings: &WindowSettings) -> WindowBounds {
        self.get::<WindowBounds>(WINDOW_KEY)
            .map(|bounds| bounds.clamped(settings))
            .unwrap_or_else(|| WindowBounds::default_for(settings))
    }

    pub fn save_window_bounds(&mut self, bounds: WindowBounds) -> Result<()> {
        self.set(WINDOW_KEY, &bounds)
    }

    fn save(&self) -> Result<()> {
        let content =
            serde_json::to_string_pretty(&self.values).context("Failed to serialize settings")?;

        atomic_write(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))
    }
}

fn read_values(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))
}

/// Get the settings file path
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn window_bounds_default_when_missing() {
        let temp = tempdir().unwrap();
        let store = SettingsStore::open(temp.path().join("settings.json"));

        let bounds = store.window_bounds(&WindowSettings::default());

        assert_eq!(
            bounds,
            WindowBounds {
                x: None,
                y: None,
                width: 1400,
                height: 900
            }
        );
    }

    #[test]
    fn window_bounds_survive_restart() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.json");
        let saved = WindowBounds {
            x: Some(-120),
            y: Some(48),
            width: 1024,
            height: 768,
        };

        SettingsStore::open(&path).save_window_bounds(saved).unwrap();
        let restored = SettingsStore::open(&path).window_bounds(&WindowSettings::default());

        assert_eq!(restored, saved);
    }

    #[test]
    fn window_bounds_respect_minimum_size() {
        let temp = tempdir().unwrap();
        let mut store = SettingsStore::open(temp.path().join("settings.json"));
        store
            .save_window_bounds(WindowBounds {
                x: None,
                y: None,
                width: 10,
                height: 10,
            })
            .unwrap();

        let bounds = store.window_bounds(&WindowSettings::default());

        assert_eq!((bounds.width, bounds.height), (800, 600));
    }

    #[test]
    fn set_preserves_other_keys() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let mut store = SettingsStore::open(&path);
        store
            .save_window_bounds(WindowBounds::default_for(&WindowSettings::default()))
            .unwrap();

        let reopened = SettingsStore::open(&path);
        assert_eq!(reopened.get::<String>("theme").as_deref(), Some("dark"));
        assert!(reopened.get::<WindowBounds>(WINDOW_KEY).is_some());
    }

    #[test]
    fn corrupted_file_starts_empty_store() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::open(&path);

        assert!(store.get::<WindowBounds>(WINDOW_KEY).is_none());
    }

    #[test]
    fn malformed_window_entry_falls_back_to_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{"window": {"width": "wide"}}"#).unwrap();

        let bounds = SettingsStore::open(&path).window_bounds(&WindowSettings::default());

        assert_eq!(bounds, WindowBounds::default_for(&WindowSettings::default()));
    }

    #[test]
    fn save_creates_parent_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("settings.json");

        let mut store = SettingsStore::open(&path);
        store.set("answer", &42).unwrap();

        assert!(path.exists());
    }
}
