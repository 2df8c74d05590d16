//! Mounting a view as an axum handler.
//!
//! The returned `MethodRouter` accepts every method: which methods a view
//! serves is decided by its registry, not by axum's method routing.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, MethodRouter};

use crate::views::{Dispatcher, ViewRegistry, ViewRequest};

/// A view registry bound to its state and a dispatcher.
pub struct MountedView<V> {
    registry: Arc<ViewRegistry<V>>,
    view: Arc<V>,
    dispatcher: Dispatcher,
    body_limit: usize,
}

impl<V> Clone for MountedView<V> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            view: self.view.clone(),
            dispatcher: self.dispatcher.clone(),
            body_limit: self.body_limit,
        }
    }
}

impl<V: Send + Sync + 'static> MountedView<V> {
    pub fn new(registry: Arc<ViewRegistry<V>>, view: Arc<V>, dispatcher: Dispatcher, body_limit: usize) -> Self {
        Self {
            registry,
            view,
            dispatcher,
            body_limit,
        }
    }

    /// Serve one request end to end.
    pub async fn serve(&self, request: Request<Body>) -> Response {
        let request = match ViewRequest::from_request(request, self.body_limit).await {
            Ok(r) => r,
            Err(e) => return e.into_response(),
        };

        self.dispatcher
            .dispatch(&self.registry, &self.view, request)
            .await
            .into_response()
    }

    pub fn into_method_router(self) -> MethodRouter {
        any(move |request: Request<Body>| {
            let mounted = self.clone();
            async move { mounted.serve(request).await }
        })
    }
}

/// Turn a registry and its view state into an axum handler.
pub fn as_view<V: Send + Sync + 'static>(
    registry: Arc<ViewRegistry<V>>,
    view: Arc<V>,
    dispatcher: Dispatcher,
    body_limit: usize,
) -> MethodRouter {
    MountedView::new(registry, view, dispatcher, body_limit).into_method_router()
}
