use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File type filter shown in a dialog, e.g. `{ name: "Images", extensions: ["png"] }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDialogOptions {
    pub title: Option<String>,
    pub default_path: Option<PathBuf>,
    #[serde(default)]
    pub filters: Vec<FileFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDialogOptions {
    pub title: Option<String>,
    pub default_path: Option<PathBuf>,
    #[serde(default)]
    pub filters: Vec<FileFilter>,
    #[serde(default)]
    pub properties: Vec<OpenDialogProperty>,
}

impl OpenDialogOptions {
    pub fn has(&self, property: OpenDialogProperty) -> bool {
        self.properties.contains(&property)
    }
}

/// Open dialog flags; names the UI does not know about are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpenDialogProperty {
    OpenFile,
    OpenDirectory,
    MultiSelections,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDialogResult {
    pub canceled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl SaveDialogResult {
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            file_path: None,
        }
    }

    pub fn from_selection(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self {
                canceled: false,
                file_path: Some(path),
            },
            None => Self::canceled(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDialogResult {
    pub canceled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_paths: Option<Vec<PathBuf>>,
}

impl OpenDialogResult {
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            file_paths: None,
        }
    }

    /// An empty selection counts as canceled
    pub fn from_selection(paths: Vec<PathBuf>) -> Self {
        if paths.is_empty() {
            return Self::canceled();
        }
        Self {
            canceled: false,
            file_paths: Some(paths),
        }
    }
}
