//! Declaration options for a handler.
//!
//! Options are collected first and validated when the owning registry is
//! built, so a chained declaration can stay infallible while every problem
//! still surfaces before any request is served.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;
use crate::views::rule::{MatchRule, Predicate};

/// Option names recognized in declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOption {
    Method,
    Param,
    TemplateName,
}

impl ViewOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewOption::Method => "method",
            ViewOption::Param => "param",
            ViewOption::TemplateName => "template_name",
        }
    }
}

impl FromStr for ViewOption {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "method" => Ok(ViewOption::Method),
            "param" => Ok(ViewOption::Param),
            "template_name" => Ok(ViewOption::TemplateName),
            other => Err(ConfigurationError::UnknownOption {
                option: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ViewOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The options of one handler declaration.
///
/// ```ignore
/// HandlerOptions::new()
///     .method("get")
///     .param("flip")
///     .template_name("top2.html")
/// ```
#[derive(Debug, Default, Clone)]
pub struct HandlerOptions {
    rules: Vec<MatchRule>,
    template_name: Option<String>,
    has_method: bool,
    errors: Vec<ConfigurationError>,
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse string-keyed options, as found in a config file.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |options, (key, value)| options.set(key, value))
    }

    /// Set an option by name. Unknown names are recorded and reported by
    /// [`HandlerOptions::into_parts`].
    pub fn set(self, key: &str, value: &str) -> Self {
        match key.parse::<ViewOption>() {
            Ok(ViewOption::Method) => self.method(value),
            Ok(ViewOption::Param) => self.param(value),
            Ok(ViewOption::TemplateName) => self.template_name(value),
            Err(e) => self.record(e),
        }
    }

    /// Restrict the handler to one HTTP method.
    pub fn method(mut self, method: &str) -> Self {
        if self.has_method {
            return self.record(ConfigurationError::DuplicateOption {
                option: ViewOption::Method.to_string(),
            });
        }
        self.has_method = true;
        match MatchRule::method(method) {
            Ok(rule) => {
                self.rules.push(rule);
                self
            }
            Err(e) => self.record(e),
        }
    }

    /// Require a request parameter to be present. May be given several times.
    pub fn param(mut self, name: &str) -> Self {
        match MatchRule::param(name) {
            Ok(rule) => {
                self.rules.push(rule);
                self
            }
            Err(e) => self.record(e),
        }
    }

    /// Require a user-defined predicate to hold.
    pub fn predicate(mut self, name: &str, predicate: impl Predicate + 'static) -> Self {
        self.rules.push(MatchRule::custom(name, predicate));
        self
    }

    /// Template rendered when the handler returns a context.
    pub fn template_name(mut self, name: &str) -> Self {
        if self.template_name.is_some() {
            return self.record(ConfigurationError::DuplicateOption {
                option: ViewOption::TemplateName.to_string(),
            });
        }
        self.template_name = Some(name.to_string());
        self
    }

    fn record(mut self, error: ConfigurationError) -> Self {
        self.errors.push(error);
        self
    }

    /// Validate and split into match rules and template name.
    pub fn into_parts(mut self) -> Result<(Vec<MatchRule>, Option<String>), ConfigurationError> {
        if self.rules.is_empty() && self.errors.is_empty() {
            self.errors.push(ConfigurationError::EmptyPredicates);
        }
        match ConfigurationError::collect(self.errors) {
            Some(err) => Err(err),
            None => Ok((self.rules, self.template_name)),
        }
    }
}
