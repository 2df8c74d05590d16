//! Predicate-dispatched views over Axum.

pub mod config;
pub mod demo;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod templates;
pub mod views;

pub use config::schema::ServerConfig;
pub use error::{ConfigurationError, DispatchError, ViewError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use views::{Dispatcher, HandlerOptions, HandlerOutput, ViewRegistry, ViewRequest};
