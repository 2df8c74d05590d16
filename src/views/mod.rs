//! Predicate-dispatched views.
//!
//! # Data Flow
//! ```text
//! View definition (once, at startup):
//!     ViewRegistry::builder(..).handler(name, HandlerOptions, fn)
//!     → options.rs (recognize options, fail fast)
//!     → rule.rs (MatchRule per constraint)
//!     → registry.rs (ordered, frozen ViewRegistry)
//!
//! Incoming Request:
//!     → context.rs (method + merged params)
//!     → dispatcher.rs (first matching entry, else fallback, else 405)
//!     → handler.rs (invoke) → output.rs (context | response)
//!     → TemplateRenderer for contexts, passthrough for responses
//! ```
//!
//! # Design Decisions
//! - Declaration order is priority: the first entry whose predicates all
//!   hold is the one invoked, even if a later entry is more specific
//! - Registries are immutable values passed explicitly, not global state

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod options;
pub mod output;
pub mod registry;
pub mod rule;

pub use context::{DispatchContext, Params, ViewRequest};
pub use dispatcher::{Dispatched, Dispatcher, Selection};
pub use handler::{BoxedHandler, Handler, HandlerResult};
pub use options::{HandlerOptions, ViewOption};
pub use output::{ContextMap, HandlerOutput};
pub use registry::{validate_templates, FallbackEntry, HandlerCatalog, HandlerEntry, ViewRegistry, ViewRegistryBuilder};
pub use rule::{MatchRule, Predicate, RuleKind};
