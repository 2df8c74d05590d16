//! Config-driven mounting of views.
//!
//! # Responsibilities
//! - Map a config `kind` to the code that provides its state and handlers
//! - Build every configured view's registry and check its templates
//! - Collect all definition errors before any route is served
//!
//! # Design Decisions
//! - View state types differ per kind, so each kind is erased behind
//!   `MountView` and produces a plain axum `MethodRouter`

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::routing::MethodRouter;
use axum::Router;

use crate::config::ViewConfig;
use crate::error::ConfigurationError;
use crate::http::view::as_view;
use crate::views::{validate_templates, Dispatcher, HandlerCatalog, ViewRegistry};

/// Something that can turn a [`ViewConfig`] into a route.
pub trait MountView: Send + Sync {
    fn mount(&self, config: &ViewConfig, dispatcher: &Dispatcher, body_limit: usize) -> Result<MethodRouter, ConfigurationError>;
}

/// View state plus the handlers config files may refer to.
pub struct ViewKind<V> {
    state: Arc<V>,
    catalog: HandlerCatalog<V>,
}

impl<V: Send + Sync + 'static> ViewKind<V> {
    pub fn new(state: V, catalog: HandlerCatalog<V>) -> Self {
        Self {
            state: Arc::new(state),
            catalog,
        }
    }
}

impl<V: Send + Sync + 'static> MountView for ViewKind<V> {
    fn mount(&self, config: &ViewConfig, dispatcher: &Dispatcher, body_limit: usize) -> Result<MethodRouter, ConfigurationError> {
        let registry = ViewRegistry::from_config(config, &self.catalog);
        let templates = validate_templates(&config.name, config.template_names(), dispatcher.renderer());
        let registry = match (registry, templates) {
            (Ok(registry), Ok(())) => registry,
            (Err(e), Ok(())) | (Ok(_), Err(e)) => return Err(e),
            (Err(registry), Err(templates)) => return Err(ConfigurationError::Multiple(vec![registry, templates])),
        };

        tracing::info!(
            view = %config.name,
            path = %config.path,
            handlers = registry.entries().len(),
            "View mounted"
        );

        Ok(as_view(Arc::new(registry), self.state.clone(), dispatcher.clone(), body_limit))
    }
}

/// All view kinds known to the application.
#[derive(Default)]
pub struct Site {
    kinds: HashMap<String, Box<dyn MountView>>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<V: Send + Sync + 'static>(mut self, kind: &str, view: ViewKind<V>) -> Self {
        self.kinds.insert(kind.to_string(), Box::new(view));
        self
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Mount every configured view, or report every definition error.
    pub fn build_router(&self, views: &[ViewConfig], dispatcher: &Dispatcher, body_limit: usize) -> Result<Router, ConfigurationError> {
        let mut router = Router::new();
        let mut errors = Vec::new();

        for config in views {
            let Some(kind) = self.kinds.get(config.kind()) else {
                errors.push(ConfigurationError::UnknownViewKind {
                    view: config.name.clone(),
                    kind: config.kind().to_string(),
                });
                continue;
            };

            let method_router = match kind.mount(config, dispatcher, body_limit) {
                Ok(method_router) => method_router,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            // axum panics on route syntax and conflicts it rejects.
            let next = router.clone();
            match panic::catch_unwind(AssertUnwindSafe(move || next.route(&config.path, method_router))) {
                Ok(next) => router = next,
                Err(payload) => errors.push(ConfigurationError::InvalidRoute {
                    view: config.name.clone(),
                    path: config.path.clone(),
                    reason: panic_message(&*payload),
                }),
            }
        }

        match ConfigurationError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(router),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "route rejected".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerDeclaration;
    use crate::demo;
    use crate::templates::TeraRenderer;

    fn top(path: &str, default_template: &str, handlers: &[&str]) -> ViewConfig {
        ViewConfig {
            name: "top".into(),
            kind: None,
            path: path.into(),
            default_template: Some(default_template.into()),
            handlers: handlers
                .iter()
                .map(|handler| HandlerDeclaration {
                    handler: handler.to_string(),
                    options: [("method".to_string(), "get".to_string())].into_iter().collect(),
                })
                .collect(),
            fallbacks: vec![],
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(TeraRenderer::from_raw([("top.html", "{{ word }}")]).unwrap()))
    }

    #[test]
    fn test_rejected_route_reported_not_panicked() {
        let views = [top("/users/:id", "top.html", &["get"])];
        let err = demo::site().build_router(&views, &dispatcher(), 1024).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidRoute { ref path, .. } if path == "/users/:id"));
    }

    #[test]
    fn test_handler_and_template_errors_collected() {
        let views = [top("/", "missing.html", &["nope"])];
        let err = demo::site().build_router(&views, &dispatcher(), 1024).unwrap_err();
        let errors = err.flatten();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ConfigurationError::UnknownHandler { handler, .. } if handler == "nope"));
        assert!(matches!(errors[1], ConfigurationError::UnknownTemplate { template, .. } if template == "missing.html"));
    }
}
