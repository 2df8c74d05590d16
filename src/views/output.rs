//! What a handler produces: a context for template rendering or a complete
//! response passed through untouched.

use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ViewError;

/// Key-value data handed to the template renderer.
pub type ContextMap = Map<String, Value>;

#[derive(Debug)]
pub enum HandlerOutput {
    /// Rendered with the handler's template (or the view default).
    Context(ContextMap),
    /// Returned to the client as is.
    Response(Response),
}

impl HandlerOutput {
    /// Serialize `value` into a context. It must serialize to a JSON object.
    pub fn context<T: Serialize>(value: &T) -> Result<Self, ViewError> {
        match serde_json::to_value(value).map_err(ViewError::internal)? {
            Value::Object(map) => Ok(HandlerOutput::Context(map)),
            other => Err(ViewError::internal(format!(
                "handler context must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Wrap anything that converts into a response.
    pub fn response(response: impl IntoResponse) -> Self {
        HandlerOutput::Response(response.into_response())
    }

    pub fn is_context(&self) -> bool {
        matches!(self, HandlerOutput::Context(_))
    }
}

impl From<ContextMap> for HandlerOutput {
    fn from(map: ContextMap) -> Self {
        HandlerOutput::Context(map)
    }
}

impl From<Response> for HandlerOutput {
    fn from(response: Response) -> Self {
        HandlerOutput::Response(response)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_context_from_object() {
        let output = HandlerOutput::context(&json!({"word": "hello"})).unwrap();
        match output {
            HandlerOutput::Context(map) => assert_eq!(map["word"], "hello"),
            HandlerOutput::Response(_) => panic!("expected context"),
        }
    }

    #[test]
    fn test_context_rejects_non_object() {
        let err = HandlerOutput::context(&vec![1, 2]).unwrap_err();
        assert_eq!(err.to_string(), "handler context must be a JSON object, got an array");
    }

    #[test]
    fn test_response_passthrough() {
        let output = HandlerOutput::response((StatusCode::ACCEPTED, "raw"));
        assert!(!output.is_context());
    }
}
