//! Template rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     TemplateConfig.directory
//!     → renderer.rs (parse every template into a Tera set)
//!     → views validate their template names against it
//!
//! Request:
//!     Dispatcher → TemplateRenderer::render(name, context, request) → Response
//!
//! On file change (optional):
//!     watcher.rs → renderer.reload() → atomic swap of the template set
//! ```

pub mod renderer;
pub mod watcher;

pub use renderer::{RenderError, TemplateRenderer, TeraRenderer};
pub use watcher::TemplateWatcher;
