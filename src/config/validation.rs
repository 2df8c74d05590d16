//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting views (duplicate names or paths)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Handler options are checked later by the view layer, which knows the
//!   recognized option names and the handler catalog

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServerConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("observability.log_level `{0}` is not a valid filter")]
    LogLevel(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("listener.max_body_size must be greater than zero")]
    ZeroBodySize,

    #[error("view name must not be empty")]
    EmptyViewName,

    #[error("view `{0}` is declared more than once")]
    DuplicateViewName(String),

    #[error("view `{view}` path `{path}` must start with `/`")]
    InvalidPath { view: String, path: String },

    #[error("view `{view}` path `{path}` {reason}")]
    PathSyntax {
        view: String,
        path: String,
        reason: &'static str,
    },

    #[error("views `{first}` and `{second}` are both mounted at `{path}`")]
    DuplicatePath {
        first: String,
        second: String,
        path: String,
    },
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodySize);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let observability = &config.observability;
    if EnvFilter::try_new(&observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    let mut names = HashSet::new();
    let mut paths: Vec<(String, &str)> = Vec::new();
    for view in &config.views {
        if view.name.is_empty() {
            errors.push(ValidationError::EmptyViewName);
        } else if !names.insert(view.name.as_str()) {
            errors.push(ValidationError::DuplicateViewName(view.name.clone()));
        }

        if !view.path.starts_with('/') {
            errors.push(ValidationError::InvalidPath {
                view: view.name.clone(),
                path: view.path.clone(),
            });
        } else if let Some(reason) = path_syntax(&view.path) {
            errors.push(ValidationError::PathSyntax {
                view: view.name.clone(),
                path: view.path.clone(),
                reason,
            });
        }

        // `/users/{id}` and `/users/{name}` are the same route to the router.
        let shape = route_shape(&view.path);
        match paths.iter().find(|(existing, _)| *existing == shape) {
            Some((_, first)) => errors.push(ValidationError::DuplicatePath {
                first: first.to_string(),
                second: view.name.clone(),
                path: view.path.clone(),
            }),
            None => paths.push((shape, view.name.as_str())),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Route syntax the router would refuse. Captures must be whole segments
/// (`{name}`, or `{*name}` as the last segment).
fn path_syntax(path: &str) -> Option<&'static str> {
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    let mut captures = HashSet::new();

    for (i, segment) in segments.iter().enumerate() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return Some("uses `:name`/`*name` captures; write `{name}` or `{*name}`");
        }

        let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
            if segment.contains(['{', '}']) {
                return Some("has a brace outside a whole-segment `{name}` capture");
            }
            continue;
        };

        let (name, wildcard) = match inner.strip_prefix('*') {
            Some(name) => (name, true),
            None => (inner, false),
        };
        if name.is_empty() || name.contains(['{', '}', '*']) {
            return Some("has an empty or malformed capture");
        }
        if wildcard && i + 1 != segments.len() {
            return Some("has a `{*name}` wildcard before the last segment");
        }
        if !captures.insert(name) {
            return Some("repeats a capture name");
        }
    }

    None
}

/// Path with capture names erased.
fn route_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) if inner.starts_with('*') => "{*}",
            Some(_) => "{}",
            None => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}
