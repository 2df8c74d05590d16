//! Template directory watcher for hot reload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::templates::renderer::TeraRenderer;

/// Reloads a directory-backed [`TeraRenderer`] whenever a file under its
/// directory changes.
pub struct TemplateWatcher {
    path: PathBuf,
    renderer: Arc<TeraRenderer>,
}

impl TemplateWatcher {
    /// Returns `None` for renderers that are not backed by a directory.
    pub fn new(renderer: Arc<TeraRenderer>) -> Option<Self> {
        let path = renderer.directory()?.to_path_buf();
        Some(Self { path, renderer })
    }

    /// Start watching in a background thread. Dropping the returned watcher
    /// stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let renderer = self.renderer.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        tracing::debug!(paths = ?event.paths, "Template change detected");
                        if let Err(e) = renderer.reload() {
                            tracing::error!(error = %e, "Failed to reload templates, keeping current set");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Template watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::Recursive)?;

        tracing::info!(path = ?self.path, "Template watcher started");
        Ok(watcher)
    }
}
