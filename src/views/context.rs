//! Per-request dispatch input.
//!
//! # Responsibilities
//! - Merge query string and urlencoded form body into one parameter lookup
//! - Carry the request method for method predicates
//! - Hand handlers a cheap, owned copy of the request facets they may read
//!
//! # Design Decisions
//! - Parameter presence is what predicates test, so a key with an empty
//!   value is still present
//! - Query values precede form values under the same key
//! - Only `application/x-www-form-urlencoded` bodies are parsed; other bodies
//!   stay available as raw bytes

use std::collections::HashMap;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::error::ViewError;

/// Read-only key to values lookup over query and form parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, Vec<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an urlencoded string such as a query (`a=1&b=&c`).
    pub fn from_urlencoded(input: &[u8]) -> Self {
        let mut params = Self::new();
        params.extend_urlencoded(input);
        params
    }

    /// Append all pairs of an urlencoded string, keeping earlier values first.
    pub fn extend_urlencoded(&mut self, input: &[u8]) {
        for (key, value) in url::form_urlencoded::parse(input) {
            self.insert(key.into_owned(), value.into_owned());
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// True when `key` was supplied, whatever its value.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// First value supplied for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// The two request facets predicates are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    method: Method,
    params: Params,
}

impl DispatchContext {
    pub fn new(method: Method, params: Params) -> Self {
        Self { method, params }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// What a handler receives for one request.
#[derive(Debug, Clone)]
pub struct ViewRequest {
    context: DispatchContext,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl ViewRequest {
    pub fn new(context: DispatchContext, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            context,
            uri,
            headers,
            body,
        }
    }

    /// Buffer the body (up to `body_limit` bytes) and build the parameter
    /// lookup from the query string and any urlencoded form body.
    ///
    /// A body over the limit is `413 Payload Too Large`; one that fails to
    /// read is `400 Bad Request`.
    pub async fn from_request(request: Request<Body>, body_limit: usize) -> Result<Self, ViewError> {
        if declared_length(request.headers()).is_some_and(|len| len > body_limit as u64) {
            return Err(ViewError::payload_too_large());
        }

        let (parts, body) = request.into_parts();
        let body = Limited::new(body, body_limit)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<LengthLimitError>() {
                    ViewError::payload_too_large()
                } else {
                    ViewError::bad_request(format!("failed to read request body: {e}"))
                }
            })?
            .to_bytes();

        let mut params = parts
            .uri
            .query()
            .map(|q| Params::from_urlencoded(q.as_bytes()))
            .unwrap_or_default();

        if is_form(&parts.headers) {
            params.extend_urlencoded(&body);
        }

        Ok(Self {
            context: DispatchContext::new(parts.method, params),
            uri: parts.uri,
            headers: parts.headers,
            body,
        })
    }

    pub fn context(&self) -> &DispatchContext {
        &self.context
    }

    pub fn method(&self) -> &Method {
        self.context.method()
    }

    pub fn params(&self) -> &Params {
        self.context.params()
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_params_presence_ignores_value() {
        let params = Params::from_urlencoded(b"flip=&empty&word=hello");
        assert!(params.contains("flip"));
        assert!(params.contains("empty"));
        assert_eq!(params.get("flip"), Some(""));
        assert_eq!(params.get("word"), Some("hello"));
        assert!(!params.contains("missing"));
    }

    #[test]
    fn test_params_keep_all_values() {
        let params = Params::from_urlencoded(b"tag=a&tag=b");
        assert_eq!(params.get("tag"), Some("a"));
        assert_eq!(params.get_all("tag"), ["a".to_string(), "b".to_string()]);
        assert_eq!(params.len(), 1);
    }

    #[tokio::test]
    async fn test_from_request_merges_query_and_form() {
        let req = Request::builder()
            .method("POST")
            .uri("/top?flip=query")
            .header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
            .body(Body::from("flip=form&name=ann"))
            .unwrap();

        let view_req = ViewRequest::from_request(req, 1024).await.unwrap();
        assert_eq!(*view_req.method(), Method::POST);
        assert_eq!(view_req.path(), "/top");
        assert_eq!(view_req.params().get_all("flip"), ["query".to_string(), "form".to_string()]);
        assert_eq!(view_req.params().get("name"), Some("ann"));
    }

    #[tokio::test]
    async fn test_from_request_ignores_non_form_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/top")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"flip":"x"}"#))
            .unwrap();

        let view_req = ViewRequest::from_request(req, 1024).await.unwrap();
        assert!(view_req.params().is_empty());
        assert_eq!(view_req.body().as_ref(), br#"{"flip":"x"}"#);
    }

    #[tokio::test]
    async fn test_from_request_body_limit() {
        let req = Request::builder()
            .method("POST")
            .uri("/top")
            .body(Body::from(vec![b'a'; 64]))
            .unwrap();

        let err = ViewRequest::from_request(req, 8).await.unwrap_err();
        assert!(matches!(err, ViewError::Http { status, .. } if status == StatusCode::PAYLOAD_TOO_LARGE));
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_rejected_before_reading() {
        let req = Request::builder()
            .method("POST")
            .uri("/top")
            .header("Content-Length", "4096")
            .body(Body::from("short"))
            .unwrap();

        let err = ViewRequest::from_request(req, 1024).await.unwrap_err();
        assert!(matches!(err, ViewError::Http { status, .. } if status == StatusCode::PAYLOAD_TOO_LARGE));
    }

    #[tokio::test]
    async fn test_body_at_limit_accepted() {
        let req = Request::builder()
            .method("POST")
            .uri("/top")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from("a=123456"))
            .unwrap();

        let view_req = ViewRequest::from_request(req, 8).await.unwrap();
        assert_eq!(view_req.params().get("a"), Some("123456"));
    }
}
