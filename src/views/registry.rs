//! Handler registry for one view.
//!
//! # Data Flow
//! ```text
//! Definition time:
//!     builder.handler(name, options, fn)   (or [[views.handlers]] + HandlerCatalog)
//!     → HandlerOptions::into_parts (fail fast on unknown/invalid options)
//!     → HandlerEntry appended in declaration order
//!     → build() freezes an immutable ViewRegistry
//!
//! Request time:
//!     Dispatcher walks entries() in order, then fallback(method)
//! ```
//!
//! # Design Decisions
//! - Declaration order is dispatch priority; there is no specificity ranking
//! - All definition errors of one build are reported together
//! - Registry is immutable after build and shared through `Arc`

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::config::ViewConfig;
use crate::error::ConfigurationError;
use crate::templates::TemplateRenderer;
use crate::views::context::DispatchContext;
use crate::views::handler::{BoxedHandler, Handler};
use crate::views::options::HandlerOptions;
use crate::views::rule::{parse_method, MatchRule};

/// One declared handler.
pub struct HandlerEntry<V> {
    name: String,
    predicates: Vec<MatchRule>,
    template_name: Option<String>,
    handler: BoxedHandler<V>,
}

impl<V> HandlerEntry<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicates(&self) -> &[MatchRule] {
        &self.predicates
    }

    pub fn template_name(&self) -> Option<&str> {
        self.template_name.as_deref()
    }

    pub fn handler(&self) -> &dyn Handler<V> {
        self.handler.as_ref()
    }

    /// True when every predicate holds.
    pub fn matches(&self, ctx: &DispatchContext) -> bool {
        self.predicates.iter().all(|rule| rule.matches(ctx))
    }
}

impl<V> std::fmt::Debug for HandlerEntry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("name", &self.name)
            .field("predicates", &self.predicates)
            .field("template_name", &self.template_name)
            .finish()
    }
}

/// A handler selected by method name when no declared handler matches.
pub struct FallbackEntry<V> {
    name: String,
    handler: BoxedHandler<V>,
}

impl<V> FallbackEntry<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &dyn Handler<V> {
        self.handler.as_ref()
    }
}

/// Immutable, ordered handler registry of one view.
pub struct ViewRegistry<V> {
    name: String,
    entries: Vec<HandlerEntry<V>>,
    fallbacks: HashMap<Method, FallbackEntry<V>>,
    fallback_order: Vec<Method>,
    default_template: Option<String>,
}

impl<V: Send + Sync + 'static> ViewRegistry<V> {
    pub fn builder(name: impl Into<String>) -> ViewRegistryBuilder<V> {
        ViewRegistryBuilder::new(name)
    }

    /// Build a registry from a config declaration, resolving handler names
    /// through `catalog`.
    pub fn from_config(config: &ViewConfig, catalog: &HandlerCatalog<V>) -> Result<Self, ConfigurationError> {
        let mut builder = ViewRegistryBuilder::new(config.name.clone());
        if let Some(template) = &config.default_template {
            builder = builder.default_template(template);
        }

        for decl in &config.handlers {
            let options = HandlerOptions::from_pairs(
                decl.options.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            );
            builder = match catalog.get(&decl.handler) {
                Some(handler) => builder.push_entry(&decl.handler, options, handler),
                None => builder.record(ConfigurationError::UnknownHandler {
                    view: config.name.clone(),
                    handler: decl.handler.clone(),
                }),
            };
        }

        for decl in &config.fallbacks {
            builder = match catalog.get(&decl.handler) {
                Some(handler) => builder.push_fallback(&decl.method, handler),
                None => builder.record(ConfigurationError::UnknownHandler {
                    view: config.name.clone(),
                    handler: decl.handler.clone(),
                }),
            };
        }

        builder.build()
    }
}

impl<V> ViewRegistry<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared handlers in dispatch order.
    pub fn entries(&self) -> &[HandlerEntry<V>] {
        &self.entries
    }

    pub fn default_template(&self) -> Option<&str> {
        self.default_template.as_deref()
    }

    /// Fallback registered for `method`, whatever the case of the request
    /// method (`get` finds the `GET` fallback).
    pub fn fallback(&self, method: &Method) -> Option<&FallbackEntry<V>> {
        match self.fallbacks.get(method) {
            Some(entry) => Some(entry),
            None => parse_method(method.as_str())
                .ok()
                .and_then(|normalized| self.fallbacks.get(&normalized)),
        }
    }

    /// First entry at or after `start` whose predicates all hold.
    pub fn find_entry(&self, ctx: &DispatchContext, start: usize) -> Option<(usize, &HandlerEntry<V>)> {
        self.entries
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, entry)| entry.matches(ctx))
    }

    /// Methods this view can serve: declared method rules then fallbacks,
    /// deduplicated in declaration order.
    pub fn allowed_methods(&self) -> Vec<Method> {
        let declared = self.entries.iter().flat_map(|e| {
            e.predicates.iter().filter_map(|rule| match rule {
                MatchRule::Method(m) => Some(m.clone()),
                _ => None,
            })
        });

        let mut methods: Vec<Method> = Vec::new();
        for method in declared.chain(self.fallback_order.iter().cloned()) {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        methods
    }
}

impl<V> std::fmt::Debug for ViewRegistry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("name", &self.name)
            .field("entries", &self.entries)
            .field("fallbacks", &self.fallback_order)
            .field("default_template", &self.default_template)
            .finish()
    }
}

/// Check that the renderer knows every template `view` names.
pub fn validate_templates<'a>(
    view: &str,
    templates: impl IntoIterator<Item = &'a str>,
    renderer: &dyn TemplateRenderer,
) -> Result<(), ConfigurationError> {
    let errors = templates
        .into_iter()
        .filter(|template| !renderer.has_template(template))
        .map(|template| ConfigurationError::UnknownTemplate {
            view: view.to_string(),
            template: template.to_string(),
        })
        .collect();
    match ConfigurationError::collect(errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Collects declarations for a [`ViewRegistry`].
pub struct ViewRegistryBuilder<V> {
    name: String,
    entries: Vec<HandlerEntry<V>>,
    fallbacks: HashMap<Method, FallbackEntry<V>>,
    fallback_order: Vec<Method>,
    default_template: Option<String>,
    errors: Vec<ConfigurationError>,
}

impl<V: Send + Sync + 'static> ViewRegistryBuilder<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            fallbacks: HashMap::new(),
            fallback_order: Vec::new(),
            default_template: None,
            errors: Vec::new(),
        }
    }

    /// View-level template used when a handler declares none.
    pub fn default_template(mut self, name: &str) -> Self {
        self.default_template = Some(name.to_string());
        self
    }

    /// Declare a handler. Entries are tried in the order they are declared.
    pub fn handler<H: Handler<V>>(self, name: &str, options: HandlerOptions, handler: H) -> Self {
        self.push_entry(name, options, Arc::new(handler))
    }

    /// Register a method-named fallback (`"get"`, `"post"`, ...).
    pub fn fallback<H: Handler<V>>(self, method: &str, handler: H) -> Self {
        self.push_fallback(method, Arc::new(handler))
    }

    fn push_entry(mut self, name: &str, options: HandlerOptions, handler: BoxedHandler<V>) -> Self {
        if self.entries.iter().any(|e| e.name == name) {
            let view = self.name.clone();
            return self.record(ConfigurationError::DuplicateHandler {
                view,
                handler: name.to_string(),
            });
        }

        match options.into_parts() {
            Ok((predicates, template_name)) => {
                if let Some(shadow) = self.entries.iter().find(|e| same_predicates(&e.predicates, &predicates)) {
                    tracing::debug!(
                        view = %self.name,
                        handler = %name,
                        shadowed_by = %shadow.name,
                        "Handler has the same predicates as an earlier one and is unreachable"
                    );
                }
                self.entries.push(HandlerEntry {
                    name: name.to_string(),
                    predicates,
                    template_name,
                    handler,
                });
                self
            }
            Err(e) => {
                let err = ConfigurationError::in_handler(&self.name, name, e);
                self.record(err)
            }
        }
    }

    fn push_fallback(mut self, method: &str, handler: BoxedHandler<V>) -> Self {
        let method = match parse_method(method) {
            Ok(m) => m,
            Err(e) => {
                let err = ConfigurationError::in_handler(&self.name, &method.to_ascii_lowercase(), e);
                return self.record(err);
            }
        };

        if self.fallbacks.contains_key(&method) {
            let view = self.name.clone();
            return self.record(ConfigurationError::DuplicateFallback {
                view,
                method: method.to_string(),
            });
        }

        let name = method.as_str().to_ascii_lowercase();
        self.fallback_order.push(method.clone());
        self.fallbacks.insert(method, FallbackEntry { name, handler });
        self
    }

    fn record(mut self, error: ConfigurationError) -> Self {
        self.errors.push(error);
        self
    }

    /// Freeze the registry, or report every definition error found.
    pub fn build(self) -> Result<ViewRegistry<V>, ConfigurationError> {
        if let Some(err) = ConfigurationError::collect(self.errors) {
            return Err(err);
        }

        tracing::debug!(
            view = %self.name,
            handlers = self.entries.len(),
            fallbacks = self.fallback_order.len(),
            "View registry built"
        );

        Ok(ViewRegistry {
            name: self.name,
            entries: self.entries,
            fallbacks: self.fallbacks,
            fallback_order: self.fallback_order,
            default_template: self.default_template,
        })
    }
}

fn same_predicates(a: &[MatchRule], b: &[MatchRule]) -> bool {
    a.len() == b.len() && a.iter().all(|ra| b.iter().any(|rb| ra.same_as(rb)))
}

/// Named handlers a config file can refer to.
pub struct HandlerCatalog<V> {
    handlers: HashMap<String, BoxedHandler<V>>,
}

impl<V: Send + Sync + 'static> HandlerCatalog<V> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<H: Handler<V>>(mut self, name: &str, handler: H) -> Self {
        self.handlers.insert(name.to_string(), Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<BoxedHandler<V>> {
        self.handlers.get(name).cloned()
    }
}

impl<V: Send + Sync + 'static> Default for HandlerCatalog<V> {
    fn default() -> Self {
        Self::new()
    }
}
