//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use view_dispatch::config::ServerConfig;
use view_dispatch::demo::{self, TopView};
use view_dispatch::http::{as_view, HttpServer};
use view_dispatch::lifecycle::Shutdown;
use view_dispatch::templates::TeraRenderer;
use view_dispatch::views::Dispatcher;

/// In-memory templates that make the rendered template obvious.
pub fn renderer() -> Arc<TeraRenderer> {
    Arc::new(
        TeraRenderer::from_raw([
            ("top.html", "top:{{ word }}"),
            ("top2.html", "top2:{{ word }}"),
            ("echo.html", "{{ request.method }} {{ request.path | safe }}"),
        ])
        .unwrap(),
    )
}

/// Routes for the programmatic `top` view mounted at `/`.
pub fn top_routes() -> Router {
    let registry = Arc::new(demo::top_view_registry().unwrap());
    Router::new().route(
        "/",
        as_view(registry, Arc::new(TopView::default()), Dispatcher::new(renderer()), 1024 * 1024),
    )
}

/// `routes` wrapped in the full server middleware stack.
pub fn app(routes: Router) -> Router {
    HttpServer::new(ServerConfig::default(), routes).router()
}

/// Send one request through `router` in-process.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn form(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A server running on an ephemeral port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

pub async fn start_server(config: ServerConfig, routes: Router) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config, routes);
    let handle = tokio::spawn(server.run(listener, shutdown.signal()));

    RunningServer { addr, shutdown, handle }
}
