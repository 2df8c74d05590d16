//! Template rendering contract and its Tera implementation.
//!
//! # Responsibilities
//! - Turn `(template_name, context, request)` into a response
//! - Report whether a template exists, for startup validation
//! - Reload the template set without blocking concurrent renders
//!
//! # Design Decisions
//! - The dispatcher only sees the `TemplateRenderer` trait
//! - The template set lives behind `ArcSwap`; a reload parses a complete new
//!   set and swaps it in, so a broken edit keeps the previous set
//! - A `request` object (method, path, params) is added to the context unless
//!   the handler already supplied that key

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::response::{Html, IntoResponse, Response};
use serde_json::{json, Map, Value};
use tera::Tera;
use thiserror::Error;

use crate::views::{ContextMap, ViewRequest};

/// Error returned by a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template `{0}` not found")]
    NotFound(String),

    #[error("failed to render `{template}`: {source}")]
    Template {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("failed to load templates from {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: tera::Error,
    },
}

/// External collaborator that renders a context into a response.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template_name: &str, context: &ContextMap, request: &ViewRequest) -> Result<Response, RenderError>;

    fn has_template(&self, template_name: &str) -> bool;
}

/// Where a [`TeraRenderer`] gets its templates from.
#[derive(Debug, Clone)]
enum Source {
    Directory(PathBuf),
    Raw(Vec<(String, String)>),
}

/// Runtime template renderer backed by Tera.
pub struct TeraRenderer {
    source: Source,
    tera: ArcSwap<Tera>,
}

impl TeraRenderer {
    /// Load every file under `dir` (recursively), named by relative path.
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self, RenderError> {
        let source = Source::Directory(dir.as_ref().to_path_buf());
        let tera = load(&source)?;
        Ok(Self {
            source,
            tera: ArcSwap::from_pointee(tera),
        })
    }

    /// Build from in-memory `(name, content)` pairs.
    pub fn from_raw<N, C>(templates: impl IntoIterator<Item = (N, C)>) -> Result<Self, RenderError>
    where
        N: Into<String>,
        C: Into<String>,
    {
        let source = Source::Raw(
            templates
                .into_iter()
                .map(|(n, c)| (n.into(), c.into()))
                .collect(),
        );
        let tera = load(&source)?;
        Ok(Self {
            source,
            tera: ArcSwap::from_pointee(tera),
        })
    }

    /// Directory this renderer loads from, if any.
    pub fn directory(&self) -> Option<&Path> {
        match &self.source {
            Source::Directory(dir) => Some(dir),
            Source::Raw(_) => None,
        }
    }

    /// Parse the template set again and swap it in. On error the current
    /// set stays active.
    pub fn reload(&self) -> Result<(), RenderError> {
        let tera = load(&self.source)?;
        let count = tera.get_template_names().count();
        self.tera.store(Arc::new(tera));
        tracing::info!(templates = count, "Templates reloaded");
        Ok(())
    }

    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tera
            .load()
            .get_template_names()
            .map(|n| n.to_string())
            .collect();
        names.sort();
        names
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template_name: &str, context: &ContextMap, request: &ViewRequest) -> Result<Response, RenderError> {
        let tera = self.tera.load();
        if !tera.get_template_names().any(|n| n == template_name) {
            return Err(RenderError::NotFound(template_name.to_string()));
        }

        let mut map = context.clone();
        if !map.contains_key("request") {
            map.insert("request".to_string(), request_value(request));
        }

        let ctx = tera::Context::from_value(Value::Object(map)).map_err(|source| RenderError::Template {
            template: template_name.to_string(),
            source,
        })?;

        let body = tera.render(template_name, &ctx).map_err(|source| RenderError::Template {
            template: template_name.to_string(),
            source,
        })?;

        Ok(Html(body).into_response())
    }

    fn has_template(&self, template_name: &str) -> bool {
        self.tera.load().get_template_names().any(|n| n == template_name)
    }
}

fn load(source: &Source) -> Result<Tera, RenderError> {
    match source {
        Source::Directory(dir) => {
            let glob = format!("{}/**/*", dir.display());
            Tera::new(&glob).map_err(|source| RenderError::Load {
                path: dir.display().to_string(),
                source,
            })
        }
        Source::Raw(templates) => {
            let mut tera = Tera::default();
            tera.add_raw_templates(templates.iter().map(|(n, c)| (n.as_str(), c.as_str())))
                .map_err(|source| RenderError::Load {
                    path: "<raw>".to_string(),
                    source,
                })?;
            Ok(tera)
        }
    }
}

fn request_value(request: &ViewRequest) -> Value {
    let params: Map<String, Value> = request
        .params()
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    json!({
        "method": request.method().as_str(),
        "path": request.path(),
        "params": params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{DispatchContext, Params};
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, StatusCode, Uri};

    fn request(query: &str) -> ViewRequest {
        ViewRequest::new(
            DispatchContext::new(Method::GET, Params::from_urlencoded(query.as_bytes())),
            Uri::from_static("/top"),
            HeaderMap::new(),
            Bytes::new(),
        )
    }

    fn context(word: &str) -> ContextMap {
        let mut map = ContextMap::new();
        map.insert("word".into(), json!(word));
        map
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_render_raw_template() {
        let renderer = TeraRenderer::from_raw([("top.html", "Hello {{ word }} via {{ request.method }}")]).unwrap();
        assert!(renderer.has_template("top.html"));
        assert!(!renderer.has_template("top2.html"));

        let response = renderer.render("top.html", &context("world"), &request("")).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Hello world via GET");
    }

    #[test]
    fn test_render_missing_template() {
        let renderer = TeraRenderer::from_raw([("top.html", "x")]).unwrap();
        let err = renderer.render("nope.html", &context("x"), &request("")).unwrap_err();
        assert!(matches!(err, RenderError::NotFound(name) if name == "nope.html"));
    }

    #[test]
    fn test_invalid_template_fails_to_load() {
        let err = TeraRenderer::from_raw([("bad.html", "{% if %}")]).err().unwrap();
        assert!(matches!(err, RenderError::Load { .. }));
    }

    #[test]
    fn test_directory_reload() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top.html"), "v1 {{ word }}").unwrap();

        let renderer = TeraRenderer::from_directory(dir.path()).unwrap();
        assert_eq!(renderer.template_names(), vec!["top.html".to_string()]);

        std::fs::write(dir.path().join("top2.html"), "v2 {{ word }}").unwrap();
        renderer.reload().unwrap();
        assert!(renderer.has_template("top2.html"));

        std::fs::write(dir.path().join("broken.html"), "{% endif %}").unwrap();
        assert!(renderer.reload().is_err());
        assert!(renderer.has_template("top2.html"));
    }
}
