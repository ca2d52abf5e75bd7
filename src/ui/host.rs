use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, FileDialogBuilder, FilePath};
use tauri_plugin_opener::OpenerExt;
use tokio::sync::oneshot;
use url::Url;

use super::window::MAIN_WINDOW;
use crate::bridge::{DesktopHost, FileFilter, OpenDialogOptions, OpenDialogProperty, SaveDialogOptions};

/// OS services backed by the Tauri opener and dialog plugins
pub struct TauriHost {
    app: AppHandle,
}

impl TauriHost {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn file_dialog(
        &self,
        title: Option<String>,
        filters: &[FileFilter],
    ) -> FileDialogBuilder<tauri::Wry> {
        let mut dialog = self.app.dialog().file();

        if let Some(title) = title {
            dialog = dialog.set_title(title);
        }
        for filter in filters {
            let extensions: Vec<&str> = filter.extensions.iter().map(String::as_str).collect();
            dialog = dialog.add_filter(&filter.name, &extensions);
        }
        if let Some(window) = self.app.get_webview_window(MAIN_WINDOW) {
            dialog = dialog.set_parent(&window);
        }

        dialog
    }

    fn start_save_dialog(&self, options: SaveDialogOptions, reply: oneshot::Sender<Option<FilePath>>) {
        let mut dialog = self.file_dialog(options.title, &options.filters);

        if let Some(default_path) = &options.default_path {
            if default_path.is_dir() {
                dialog = dialog.set_directory(default_path);
            } else {
                if let Some(parent) = default_path.parent().filter(|p| p.is_dir()) {
                    dialog = dialog.set_directory(parent);
                }
                if let Some(name) = default_path.file_name() {
                    dialog = dialog.set_file_name(name.to_string_lossy());
                }
            }
        }

        dialog.save_file(move |path| {
            let _ = reply.send(path);
        });
    }

    fn start_open_dialog(&self, options: OpenDialogOptions, reply: oneshot::Sender<Vec<FilePath>>) {
        let directories = options.has(OpenDialogProperty::OpenDirectory);
        let multiple = options.has(OpenDialogProperty::MultiSelections);

        let mut dialog = self.file_dialog(options.title, &options.filters);
        if let Some(directory) = options.default_path.as_deref().and_then(existing_directory) {
            dialog = dialog.set_directory(directory);
        }

        match (directories, multiple) {
            (false, false) => dialog.pick_file(move |path| {
                let _ = reply.send(path.into_iter().collect());
            }),
            (false, true) => dialog.pick_files(move |paths| {
                let _ = reply.send(paths.unwrap_or_default());
            }),
            (true, false) => dialog.pick_folder(move |path| {
                let _ = reply.send(path.into_iter().collect());
            }),
            (true, true) => dialog.pick_folders(move |paths| {
                let _ = reply.send(paths.unwrap_or_default());
            }),
        }
    }
}

impl DesktopHost for TauriHost {
    fn open_external(&self, url: &Url) -> Result<()> {
        tracing::info!("Opening {} in the default handler", url);
        self.app
            .opener()
            .open_url(url.as_str(), None::<&str>)
            .with_context(|| format!("Failed to open {}", url))
    }

    fn has_main_window(&self) -> bool {
        self.app.get_webview_window(MAIN_WINDOW).is_some()
    }

    async fn show_save_dialog(&self, options: SaveDialogOptions) -> Result<Option<PathBuf>> {
        let (reply, selection) = oneshot::channel();
        self.start_save_dialog(options, reply);

        match selection.await.context("Save dialog closed without a result")? {
            Some(path) => Ok(Some(into_path(path)?)),
            None => Ok(None),
        }
    }

    async fn show_open_dialog(&self, options: OpenDialogOptions) -> Result<Vec<PathBuf>> {
        let (reply, selection) = oneshot::channel();
        self.start_open_dialog(options, reply);

        selection
            .await
            .context("Open dialog closed without a result")?
            .into_iter()
            .map(into_path)
            .collect()
    }
}

fn existing_directory(path: &Path) -> Option<&Path> {
    if path.is_dir() {
        Some(path)
    } else {
        path.parent().filter(|parent| parent.is_dir())
    }
}

fn into_path(path: FilePath) -> Result<PathBuf> {
    path.into_path()
        .map_err(|e| anyhow::anyhow!("Unsupported dialog selection: {}", e))
}
