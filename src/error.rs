//! Error taxonomy for view declaration and request dispatch.
//!
//! # Design Decisions
//! - `ConfigurationError` surfaces while a view is being defined (builder
//!   `build()`, config load) and is fatal: the server never starts with one.
//! - `DispatchError` surfaces per request and is converted into an HTTP
//!   response at the framework boundary (`http::response`), never here.
//! - `ViewError` is what handlers themselves return.

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::templates::RenderError;

/// Raised while a view's handler registry is being defined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unrecognized option `{option}`")]
    UnknownOption { option: String },

    #[error("option `{option}` given more than once")]
    DuplicateOption { option: String },

    #[error("`{value}` is not a valid HTTP method")]
    InvalidMethod { value: String },

    #[error("`param` requires a non-empty parameter name")]
    EmptyParam,

    #[error("handler declares no match constraints")]
    EmptyPredicates,

    #[error("view `{view}`, handler `{handler}`: {source}")]
    InHandler {
        view: String,
        handler: String,
        #[source]
        source: Box<ConfigurationError>,
    },

    #[error("view `{view}` declares handler `{handler}` twice")]
    DuplicateHandler { view: String, handler: String },

    #[error("view `{view}` declares two fallbacks for {method}")]
    DuplicateFallback { view: String, method: String },

    #[error("view `{view}` references unknown handler `{handler}`")]
    UnknownHandler { view: String, handler: String },

    #[error("view `{view}` references unknown view kind `{kind}`")]
    UnknownViewKind { view: String, kind: String },

    #[error("view `{view}` references template `{template}` which the renderer does not know")]
    UnknownTemplate { view: String, template: String },

    #[error("view `{view}` cannot be routed at `{path}`: {reason}")]
    InvalidRoute { view: String, path: String, reason: String },

    #[error("view `{view}`, handler `{handler}` returned a context but no template is configured")]
    MissingTemplate { view: String, handler: String },

    #[error("{}", join_errors(.0))]
    Multiple(Vec<ConfigurationError>),
}

impl ConfigurationError {
    /// Collapse a list of errors: `None` when empty, the error itself when
    /// there is exactly one, `Multiple` otherwise.
    pub fn collect(mut errors: Vec<ConfigurationError>) -> Option<ConfigurationError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ConfigurationError::Multiple(errors)),
        }
    }

    /// Flattened view of this error and any nested `Multiple` members.
    pub fn flatten(&self) -> Vec<&ConfigurationError> {
        match self {
            ConfigurationError::Multiple(errors) => {
                errors.iter().flat_map(|e| e.flatten()).collect()
            }
            other => vec![other],
        }
    }

    pub(crate) fn in_handler(view: &str, handler: &str, source: ConfigurationError) -> Self {
        ConfigurationError::InHandler {
            view: view.to_string(),
            handler: handler.to_string(),
            source: Box::new(source),
        }
    }
}

fn join_errors(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error returned by a handler.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The handler inspected the request and declined it. Dispatch resumes
    /// with the next declared handler.
    #[error("handler declined the request")]
    NotMatched,

    #[error("{status}: {message}")]
    Http { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl ViewError {
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        ViewError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::http(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::http(StatusCode::BAD_REQUEST, message)
    }

    pub fn payload_too_large() -> Self {
        Self::http(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
    }

    pub fn internal<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ViewError::Internal(error.into())
    }
}

/// Error produced while dispatching one request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No declared handler and no fallback could serve the request.
    #[error("method {method} not allowed for view `{view}`")]
    MethodNotAllowed {
        view: String,
        method: Method,
        allowed: Vec<Method>,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
