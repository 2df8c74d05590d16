//! End-to-end dispatch through the HTTP stack, in-process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::json;

use view_dispatch::error::ViewError;
use view_dispatch::http::{as_view, X_REQUEST_ID};
use view_dispatch::views::{
    DispatchContext, Dispatcher, HandlerOptions, HandlerOutput, HandlerResult, ViewRegistry, ViewRequest,
};

mod common;

#[tokio::test]
async fn test_flip_param_selects_flipped() {
    let (status, _, body) = common::send(common::app(common::top_routes()), common::get("/?flip=hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "top2:hello");
}

#[tokio::test]
async fn test_without_flip_selects_get() {
    let (status, headers, body) = common::send(common::app(common::top_routes()), common::get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "top:world");
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
}

#[tokio::test]
async fn test_empty_flip_is_still_present() {
    let (_, _, body) = common::send(common::app(common::top_routes()), common::get("/?flip=")).await;
    assert_eq!(body, "top2:");

    let (_, _, body) = common::send(common::app(common::top_routes()), common::get("/?flip")).await;
    assert_eq!(body, "top2:");
}

#[tokio::test]
async fn test_post_without_fallback_is_405() {
    let (status, headers, _) =
        common::send(common::app(common::top_routes()), common::form("POST", "/", "flip=hello")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], "GET");
}

#[tokio::test]
async fn test_lowercase_method_matches() {
    let request = Request::builder().method("get").uri("/?flip=x").body(Body::empty()).unwrap();
    let (status, _, body) = common::send(common::app(common::top_routes()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "top2:x");
}

#[tokio::test]
async fn test_lowercase_method_reaches_fallback() {
    let request = Request::builder().method("delete").uri("/notes").body(Body::empty()).unwrap();
    let (status, _, _) = common::send(notes_routes(), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let request = Request::builder().method("Delete").uri("/notes").body(Body::empty()).unwrap();
    let (status, _, _) = common::send(notes_routes(), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_request_id_assigned_and_propagated() {
    let (_, headers, _) = common::send(common::app(common::top_routes()), common::get("/")).await;
    assert!(headers.contains_key(&X_REQUEST_ID));

    let request = Request::builder()
        .uri("/")
        .header(&X_REQUEST_ID, "req-123")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = common::send(common::app(common::top_routes()), request).await;
    assert_eq!(headers[&X_REQUEST_ID], "req-123");
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let (status, _, _) = common::send(common::app(common::top_routes()), common::get("/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// A view exercising form parameters, fallbacks, declining handlers and
// custom predicates.

struct Notes;

async fn save(_view: Arc<Notes>, request: ViewRequest) -> HandlerResult {
    HandlerOutput::context(&json!({ "word": request.params().get("title") }))
}

async fn only_admins(_view: Arc<Notes>, request: ViewRequest) -> HandlerResult {
    if request.params().get("user") != Some("admin") {
        return Err(ViewError::NotMatched);
    }
    Ok(HandlerOutput::response((StatusCode::OK, "admin listing")))
}

async fn list(_view: Arc<Notes>, _request: ViewRequest) -> HandlerResult {
    Ok(HandlerOutput::response("public listing"))
}

async fn remove(_view: Arc<Notes>, _request: ViewRequest) -> HandlerResult {
    Ok(HandlerOutput::response(StatusCode::NO_CONTENT))
}

async fn echo(_view: Arc<Notes>, _request: ViewRequest) -> HandlerResult {
    HandlerOutput::context(&json!({}))
}

fn notes_routes() -> Router {
    let registry = ViewRegistry::builder("notes")
        .handler("save", HandlerOptions::new().method("post").param("title").template_name("top.html"), save)
        .handler("admin", HandlerOptions::new().method("get").param("user"), only_admins)
        .handler("list", HandlerOptions::new().method("get"), list)
        .handler(
            "echo",
            HandlerOptions::new()
                .method("put")
                .predicate("has_body", |ctx: &DispatchContext| !ctx.params().is_empty())
                .template_name("echo.html"),
            echo,
        )
        .fallback("delete", remove)
        .build()
        .unwrap();

    Router::new().route(
        "/notes",
        as_view(Arc::new(registry), Arc::new(Notes), Dispatcher::new(common::renderer()), 1024),
    )
}

#[tokio::test]
async fn test_form_body_params_satisfy_presence() {
    let (status, _, body) = common::send(notes_routes(), common::form("POST", "/notes", "title=groceries")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "top:groceries");

    let (status, headers, _) = common::send(notes_routes(), common::form("POST", "/notes", "body=x")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], "POST, GET, PUT, DELETE");
}

#[tokio::test]
async fn test_declined_handler_falls_through() {
    let (_, _, body) = common::send(notes_routes(), common::get("/notes?user=admin")).await;
    assert_eq!(body, "admin listing");

    let (_, _, body) = common::send(notes_routes(), common::get("/notes?user=guest")).await;
    assert_eq!(body, "public listing");
}

#[tokio::test]
async fn test_fallback_by_method_name() {
    let request = Request::builder().method("DELETE").uri("/notes").body(Body::empty()).unwrap();
    let (status, _, _) = common::send(notes_routes(), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_custom_predicate_and_request_in_template() {
    let (status, _, body) = common::send(notes_routes(), common::form("PUT", "/notes", "a=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "PUT /notes");

    let (status, _, _) = common::send(notes_routes(), common::form("PUT", "/notes", "")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let body = format!("title={}", "x".repeat(4096));
    let (status, _, _) = common::send(notes_routes(), common::form("POST", "/notes", &body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
