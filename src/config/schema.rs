//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Handler option tables are kept as plain string maps so that unknown
//! option names are reported by the view layer as configuration errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the view server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Template loading.
    pub templates: TemplateConfig,

    /// Mounted views.
    pub views: Vec<ViewConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (e.g. "info", "view_dispatch=debug").
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Template loading configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory holding templates; names are paths relative to it.
    pub directory: String,

    /// Reload templates when files under `directory` change.
    pub watch: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            directory: "templates".to_string(),
            watch: false,
        }
    }
}

/// One view mounted at a path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewConfig {
    /// View identifier for logging/metrics.
    pub name: String,

    /// Code-registered view kind providing the handlers (defaults to `name`).
    #[serde(default)]
    pub kind: Option<String>,

    /// URL path the view is mounted at.
    pub path: String,

    /// Template used when a handler declares none.
    #[serde(default)]
    pub default_template: Option<String>,

    /// Declared handlers, in dispatch order.
    #[serde(default)]
    pub handlers: Vec<HandlerDeclaration>,

    /// Method-named fallback handlers.
    #[serde(default)]
    pub fallbacks: Vec<FallbackDeclaration>,
}

impl ViewConfig {
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(&self.name)
    }

    /// Templates named by handler options and the view default.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.handlers
            .iter()
            .filter_map(|decl| decl.options.get("template_name"))
            .map(String::as_str)
            .chain(self.default_template.as_deref())
    }
}

/// `[[views.handlers]]`: a handler name plus its options.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandlerDeclaration {
    /// Name the handler is registered under in code.
    pub handler: String,

    /// Options such as `method`, `param`, `template_name`.
    #[serde(flatten)]
    pub options: BTreeMap<String, String>,
}

/// `[[views.fallbacks]]`: a method-named fallback.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackDeclaration {
    /// HTTP method served (any case).
    pub method: String,

    /// Name the handler is registered under in code.
    pub handler: String,
}
