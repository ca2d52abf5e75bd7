use std::path::{Path, PathBuf};

use super::GatewayError;
use crate::config::GatewaySettings;

/// Where to look for the gateway's JavaScript entry point
///
/// Candidates are checked in order and the first existing file wins:
/// an explicit override from the config, the packaged resources, then the
/// two development layouts of a project checkout.
#[derive(Debug, Clone, Default)]
pub struct EntryPointSearch {
    pub override_path: Option<PathBuf>,
    pub resources_dir: Option<PathBuf>,
    pub project_root: Option<PathBuf>,
}

impl EntryPointSearch {
    pub fn from_settings(settings: &GatewaySettings, resources_dir: Option<PathBuf>) -> Self {
        Self {
            override_path: settings.entry_point.clone(),
            resources_dir,
            project_root: settings.project_root.clone().or_else(default_project_root),
        }
    }

    /// Candidate paths in resolution order
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(path) = &self.override_path {
            candidates.push(path.clone());
        }

        if let Some(resources) = &self.resources_dir {
            candidates.push(resources.join("dist").join("index.js"));
        }

        if let Some(root) = &self.project_root {
            candidates.push(root.join("dist").join("index.js"));
            candidates.push(root.join("moltbot.mjs"));
        }

        candidates
    }

    /// First candidate that exists on disk
    pub fn resolve(&self) -> Result<PathBuf, GatewayError> {
        let candidates = self.candidates();

        match candidates.iter().find(|candidate| candidate.is_file()) {
            Some(found) => Ok(found.clone()),
            None => Err(GatewayError::NotFound { candidates }),
        }
    }
}

/// Checkout containing this desktop crate, used for development runs
pub fn default_project_root() -> Option<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR")).parent().map(Path::to_path_buf)
}

/// Directory next to the executable, standing in for packaged resources
/// when no GUI host provides one
pub fn default_resources_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?;

    // macOS bundles keep resources beside the MacOS/ directory
    #[cfg(target_os = "macos")]
    {
        let bundled = dir.parent().map(|contents| contents.join("Resources"));
        if let Some(bundled) = bundled.filter(|p| p.is_dir()) {
            return Some(bundled);
        }
    }

    Some(dir.to_path_buf())
}

/// Command line and environment for one gateway launch
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub entry_point: PathBuf,
}

impl LaunchPlan {
    pub fn new(settings: &GatewaySettings, entry_point: PathBuf, dev_mode: bool) -> Self {
        let mut args = vec![
            entry_point.display().to_string(),
            "gateway".to_string(),
            "--port".to_string(),
            settings.port.to_string(),
        ];
        if settings.verbose {
            args.push("--verbose".to_string());
        }

        let env = vec![
            ("CLAWDBOT_CONTROL_UI_BASE_PATH".to_string(), "./".to_string()),
            (
                "NODE_ENV".to_string(),
                if dev_mode { "development" } else { "production" }.to_string(),
            ),
        ];

        Self {
            program: settings.interpreter.clone(),
            args,
            env,
            entry_point,
        }
    }

    /// Printable command line for logs and error messages
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
