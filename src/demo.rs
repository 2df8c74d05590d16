//! The bundled `top` view.
//!
//! `flipped` is declared before `get`, so a GET carrying a `flip` parameter
//! never reaches `get` even though both accept GET.

use std::sync::Arc;

use axum::response::Redirect;
use serde_json::json;
use url::form_urlencoded;

use crate::error::{ConfigurationError, ViewError};
use crate::http::{Site, ViewKind};
use crate::views::{HandlerCatalog, HandlerOptions, HandlerOutput, HandlerResult, ViewRegistry, ViewRequest};

/// State shared by every request to the `top` view.
#[derive(Debug, Clone)]
pub struct TopView {
    default_word: String,
}

impl TopView {
    pub fn new(default_word: impl Into<String>) -> Self {
        Self {
            default_word: default_word.into(),
        }
    }
}

impl Default for TopView {
    fn default() -> Self {
        Self::new("world")
    }
}

/// Echo the `flip` parameter back as `word`.
pub async fn flipped(_view: Arc<TopView>, request: ViewRequest) -> HandlerResult {
    let word = request.params().get("flip").unwrap_or_default();
    HandlerOutput::context(&json!({ "word": word }))
}

pub async fn get(view: Arc<TopView>, _request: ViewRequest) -> HandlerResult {
    HandlerOutput::context(&json!({ "word": view.default_word }))
}

/// Redirect a submitted `word` to the flipped page.
pub async fn post(_view: Arc<TopView>, request: ViewRequest) -> HandlerResult {
    let word = request
        .params()
        .get("word")
        .ok_or_else(|| ViewError::bad_request("missing `word` parameter"))?;

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("flip", word)
        .finish();
    Ok(HandlerOutput::response(Redirect::to(&format!("{}?{}", request.path(), query))))
}

/// Handlers a config file may bind for views of kind `top`.
pub fn top_view_catalog() -> HandlerCatalog<TopView> {
    HandlerCatalog::new()
        .register("flipped", flipped)
        .register("get", get)
        .register("post", post)
}

/// The `top` view declared in code rather than in a config file.
pub fn top_view_registry() -> Result<ViewRegistry<TopView>, ConfigurationError> {
    ViewRegistry::builder("top")
        .handler(
            "flipped",
            HandlerOptions::new().method("get").param("flip").template_name("top2.html"),
            flipped,
        )
        .handler("get", HandlerOptions::new().method("get").template_name("top.html"), get)
        .build()
}

/// Every view kind the binary can mount.
pub fn site() -> Site {
    Site::new().register("top", ViewKind::new(TopView::default(), top_view_catalog()))
}
