//! Handler abstraction.
//!
//! Handlers are plain async functions taking the shared view state and the
//! request. Registering one does not alter it, so it can still be called
//! directly in tests.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::ViewError;
use crate::views::context::ViewRequest;
use crate::views::output::HandlerOutput;

/// Result type for handler functions.
pub type HandlerResult = Result<HandlerOutput, ViewError>;

/// A callable that can serve a request for view state `V`.
pub trait Handler<V>: Send + Sync + 'static {
    fn call(&self, view: Arc<V>, request: ViewRequest) -> BoxFuture<'static, HandlerResult>;
}

impl<V, F, Fut> Handler<V> for F
where
    V: Send + Sync + 'static,
    F: Fn(Arc<V>, ViewRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, view: Arc<V>, request: ViewRequest) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(view, request))
    }
}

/// A shared, type-erased handler.
pub type BoxedHandler<V> = Arc<dyn Handler<V>>;
