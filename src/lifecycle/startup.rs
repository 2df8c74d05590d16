//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Load templates
//! - Build every view registry and check its templates
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and nothing is served
//! - `serve` and `check` share this path, so `check` catches exactly what
//!   would stop the server
//! - Relative template directories resolve against the config file

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;

use crate::config::{load_config, ConfigError, ServerConfig};
use crate::error::ConfigurationError;
use crate::http::Site;
use crate::templates::{RenderError, TeraRenderer};
use crate::views::Dispatcher;

/// Error raised before the server starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("template loading failed: {0}")]
    Templates(#[from] RenderError),

    #[error("view definition failed: {0}")]
    Views(#[from] ConfigurationError),
}

/// Everything needed to serve, built and validated.
pub struct Application {
    pub config: ServerConfig,
    pub renderer: Arc<TeraRenderer>,
    pub routes: Router,
}

/// Load `path` and prepare the application.
pub fn load_application(path: &Path, site: &Site) -> Result<Application, StartupError> {
    let config = load(path)?;
    prepare(config, site)
}

/// Load and validate the config file at `path`. A relative template
/// directory is resolved against the file's own directory.
pub fn load(path: &Path) -> Result<ServerConfig, ConfigError> {
    let mut config = load_config(path)?;

    let directory = Path::new(&config.templates.directory);
    if directory.is_relative() {
        if let Some(base) = path.parent() {
            config.templates.directory = base.join(directory).display().to_string();
        }
    }

    Ok(config)
}

/// Load templates and mount every configured view.
pub fn prepare(config: ServerConfig, site: &Site) -> Result<Application, StartupError> {
    let renderer = Arc::new(TeraRenderer::from_directory(&config.templates.directory)?);
    tracing::debug!(
        directory = %config.templates.directory,
        templates = renderer.template_names().len(),
        "Templates loaded"
    );

    let dispatcher = Dispatcher::new(renderer.clone());
    let routes = site.build_router(&config.views, &dispatcher, config.listener.max_body_size)?;

    Ok(Application {
        config,
        renderer,
        routes,
    })
}
