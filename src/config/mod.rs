//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → ViewConfig entries turned into ViewRegistry values at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    FallbackDeclaration, HandlerDeclaration, ListenerConfig, LogFormat, ObservabilityConfig, ServerConfig,
    TemplateConfig, TimeoutConfig, ViewConfig,
};
pub use validation::ValidationError;
