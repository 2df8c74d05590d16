//! Request dispatch.
//!
//! # Responsibilities
//! - Select the first declared handler whose predicates all hold
//! - Fall back to the method-named handler when none does
//! - Invoke the handler and adapt its output into a response
//!
//! # Design Decisions
//! - Strict declaration order; no "best match" scoring
//! - A handler returning `ViewError::NotMatched` hands the request on to the
//!   next qualifying entry
//! - Errors are returned, never logged or converted here; the HTTP layer owns
//!   that decision
//! - No shared mutable state: one registry and one renderer are read
//!   concurrently by every request

use std::sync::Arc;
use std::time::Instant;

use axum::response::Response;

use crate::error::{ConfigurationError, DispatchError, ViewError};
use crate::observability::metrics;
use crate::templates::TemplateRenderer;
use crate::views::context::ViewRequest;
use crate::views::handler::Handler;
use crate::views::output::HandlerOutput;
use crate::views::registry::ViewRegistry;

/// How the serving handler was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Declared,
    Fallback,
}

impl Selection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Selection::Declared => "declared",
            Selection::Fallback => "fallback",
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug)]
pub struct Dispatched {
    pub handler: String,
    pub selection: Selection,
    pub response: Response,
}

/// Selects and invokes handlers, rendering context results.
#[derive(Clone)]
pub struct Dispatcher {
    renderer: Arc<dyn TemplateRenderer>,
}

impl Dispatcher {
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &dyn TemplateRenderer {
        self.renderer.as_ref()
    }

    /// Dispatch one request and record the outcome.
    pub async fn dispatch<V>(
        &self,
        registry: &ViewRegistry<V>,
        view: &Arc<V>,
        request: ViewRequest,
    ) -> Result<Response, DispatchError>
    where
        V: Send + Sync + 'static,
    {
        let start_time = Instant::now();
        let result = self.dispatch_detailed(registry, view, request).await;

        match &result {
            Ok(dispatched) => {
                tracing::debug!(
                    view = %registry.name(),
                    handler = %dispatched.handler,
                    selection = dispatched.selection.as_str(),
                    status = dispatched.response.status().as_u16(),
                    "Request dispatched"
                );
                metrics::record_dispatch(
                    registry.name(),
                    &dispatched.handler,
                    dispatched.selection.as_str(),
                    start_time,
                );
            }
            Err(e) => {
                metrics::record_dispatch(registry.name(), "none", outcome(e), start_time);
            }
        }

        result.map(|dispatched| dispatched.response)
    }

    /// Dispatch one request, reporting which handler served it.
    pub async fn dispatch_detailed<V>(
        &self,
        registry: &ViewRegistry<V>,
        view: &Arc<V>,
        request: ViewRequest,
    ) -> Result<Dispatched, DispatchError>
    where
        V: Send + Sync + 'static,
    {
        let ctx = request.context().clone();

        // 1. Declared handlers, in order
        let mut start = 0;
        while let Some((idx, entry)) = registry.find_entry(&ctx, start) {
            tracing::trace!(view = %registry.name(), handler = %entry.name(), "Handler matched");

            match self.invoke(entry.handler(), view, &request).await {
                Err(ViewError::NotMatched) => {
                    tracing::trace!(view = %registry.name(), handler = %entry.name(), "Handler declined");
                    start = idx + 1;
                }
                Err(e) => return Err(e.into()),
                Ok(output) => {
                    let response = self.finish(registry, entry.name(), entry.template_name(), output, &request)?;
                    return Ok(Dispatched {
                        handler: entry.name().to_string(),
                        selection: Selection::Declared,
                        response,
                    });
                }
            }
        }

        // 2. Method-named fallback
        if let Some(fallback) = registry.fallback(ctx.method()) {
            match self.invoke(fallback.handler(), view, &request).await {
                Err(ViewError::NotMatched) => {}
                Err(e) => return Err(e.into()),
                Ok(output) => {
                    let response = self.finish(registry, fallback.name(), None, output, &request)?;
                    return Ok(Dispatched {
                        handler: fallback.name().to_string(),
                        selection: Selection::Fallback,
                        response,
                    });
                }
            }
        }

        // 3. Nothing can serve this request
        Err(DispatchError::MethodNotAllowed {
            view: registry.name().to_string(),
            method: ctx.method().clone(),
            allowed: registry.allowed_methods(),
        })
    }

    async fn invoke<V>(
        &self,
        handler: &dyn Handler<V>,
        view: &Arc<V>,
        request: &ViewRequest,
    ) -> Result<HandlerOutput, ViewError>
    where
        V: Send + Sync + 'static,
    {
        handler.call(view.clone(), request.clone()).await
    }

    fn finish<V>(
        &self,
        registry: &ViewRegistry<V>,
        handler: &str,
        template_name: Option<&str>,
        output: HandlerOutput,
        request: &ViewRequest,
    ) -> Result<Response, DispatchError> {
        match output {
            HandlerOutput::Response(response) => Ok(response),
            HandlerOutput::Context(context) => {
                let template = template_name
                    .or(registry.default_template())
                    .ok_or_else(|| ConfigurationError::MissingTemplate {
                        view: registry.name().to_string(),
                        handler: handler.to_string(),
                    })?;
                Ok(self.renderer.render(template, &context, request)?)
            }
        }
    }
}

fn outcome(error: &DispatchError) -> &'static str {
    match error {
        DispatchError::MethodNotAllowed { .. } => "method_not_allowed",
        DispatchError::Configuration(_) => "configuration_error",
        DispatchError::View(_) => "view_error",
        DispatchError::Render(_) => "render_error",
    }
}
