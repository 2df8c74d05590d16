//! Dispatch errors as HTTP responses.
//!
//! # Design Decisions
//! - No matching handler is `405 Method Not Allowed` with an `Allow` header
//!   listing the methods the view declares
//! - Handler HTTP errors keep their status and message
//! - Configuration, render and internal failures are logged here, at the
//!   framework boundary, and answered with a bare 500

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{DispatchError, ViewError};

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match self {
            DispatchError::MethodNotAllowed { view, method, allowed } => {
                tracing::debug!(view = %view, method = %method, "No handler matched");
                let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
                let mut response = (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                response
            }
            DispatchError::View(err) => err.into_response(),
            DispatchError::Configuration(err) => {
                tracing::error!(error = %err, "View misconfigured");
                internal_error()
            }
            DispatchError::Render(err) => {
                tracing::error!(error = %err, "Template rendering failed");
                internal_error()
            }
        }
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        match self {
            ViewError::NotMatched => ViewError::not_found().into_response(),
            ViewError::Http { status, message } => (status, message).into_response(),
            ViewError::Internal(err) => {
                tracing::error!(error = %err, "Handler failed");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use axum::http::Method;

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let response = DispatchError::MethodNotAllowed {
            view: "top".into(),
            method: Method::POST,
            allowed: vec![Method::GET, Method::DELETE],
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, DELETE");
    }

    #[test]
    fn test_view_error_status_kept() {
        let response = DispatchError::View(ViewError::bad_request("missing word")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_configuration_error_is_500() {
        let response = DispatchError::Configuration(ConfigurationError::MissingTemplate {
            view: "top".into(),
            handler: "get".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unhandled_decline_is_404() {
        let response = ViewError::NotMatched.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ViewError::payload_too_large().into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
