//! Match predicates attached to declared handlers.
//!
//! # Responsibilities
//! - Match the request method (case-insensitive)
//! - Match parameter presence (value irrelevant)
//! - Allow user-defined predicates
//!
//! # Design Decisions
//! - Rules are immutable once built; a handler's rules combine with AND
//! - Method names are normalized to uppercase at definition time, so an
//!   invalid method token fails there and not per request

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::error::ConfigurationError;
use crate::views::context::DispatchContext;

/// A user-defined condition on the request.
pub trait Predicate: Send + Sync {
    /// Returns true if the request satisfies this condition.
    fn matches(&self, ctx: &DispatchContext) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&DispatchContext) -> bool + Send + Sync,
{
    fn matches(&self, ctx: &DispatchContext) -> bool {
        self(ctx)
    }
}

/// Parse a method name in any case into its uppercase `Method`.
pub(crate) fn parse_method(value: &str) -> Result<Method, ConfigurationError> {
    let upper = value.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(ConfigurationError::InvalidMethod {
            value: value.to_string(),
        });
    }
    Method::from_bytes(upper.as_bytes()).map_err(|_| ConfigurationError::InvalidMethod {
        value: value.to_string(),
    })
}

/// The kind of a [`MatchRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Method,
    ParamPresence,
    Custom,
}

/// One declared constraint on a handler.
#[derive(Clone)]
pub enum MatchRule {
    Method(Method),
    ParamPresence(String),
    Custom {
        name: String,
        predicate: Arc<dyn Predicate>,
    },
}

impl MatchRule {
    /// Build a method rule from a method name in any case (`"get"`, `"GET"`).
    pub fn method(value: &str) -> Result<Self, ConfigurationError> {
        parse_method(value).map(MatchRule::Method)
    }

    pub fn param(name: &str) -> Result<Self, ConfigurationError> {
        if name.is_empty() {
            return Err(ConfigurationError::EmptyParam);
        }
        Ok(MatchRule::ParamPresence(name.to_string()))
    }

    pub fn custom(name: impl Into<String>, predicate: impl Predicate + 'static) -> Self {
        MatchRule::Custom {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            MatchRule::Method(_) => RuleKind::Method,
            MatchRule::ParamPresence(_) => RuleKind::ParamPresence,
            MatchRule::Custom { .. } => RuleKind::Custom,
        }
    }

    /// The expected method, parameter name, or predicate name.
    pub fn value(&self) -> &str {
        match self {
            MatchRule::Method(m) => m.as_str(),
            MatchRule::ParamPresence(p) => p,
            MatchRule::Custom { name, .. } => name,
        }
    }

    pub fn matches(&self, ctx: &DispatchContext) -> bool {
        match self {
            MatchRule::Method(m) => ctx.method().as_str().eq_ignore_ascii_case(m.as_str()),
            MatchRule::ParamPresence(p) => ctx.params().contains(p),
            MatchRule::Custom { predicate, .. } => predicate.matches(ctx),
        }
    }

    /// Structural equality; custom predicates compare by name.
    pub(crate) fn same_as(&self, other: &MatchRule) -> bool {
        self.kind() == other.kind() && self.value() == other.value()
    }
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Method(m) => f.debug_tuple("Method").field(m).finish(),
            MatchRule::ParamPresence(p) => f.debug_tuple("ParamPresence").field(p).finish(),
            MatchRule::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Method(m) => write!(f, "method={}", m),
            MatchRule::ParamPresence(p) => write!(f, "param={}", p),
            MatchRule::Custom { name, .. } => write!(f, "predicate={}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::context::Params;

    fn ctx(method: Method, query: &str) -> DispatchContext {
        DispatchContext::new(method, Params::from_urlencoded(query.as_bytes()))
    }

    #[test]
    fn test_method_rule_case_insensitive() {
        let rule = MatchRule::method("get").unwrap();
        assert_eq!(rule.value(), "GET");
        assert!(rule.matches(&ctx(Method::GET, "")));
        assert!(!rule.matches(&ctx(Method::POST, "")));

        let lower = Method::from_bytes(b"get").unwrap();
        assert!(rule.matches(&ctx(lower, "")));
    }

    #[test]
    fn test_method_rule_rejects_invalid_token() {
        assert_eq!(
            MatchRule::method("not a method").unwrap_err(),
            ConfigurationError::InvalidMethod {
                value: "not a method".into()
            }
        );
        assert!(MatchRule::method("").is_err());
    }

    #[test]
    fn test_param_rule_presence_only() {
        let rule = MatchRule::param("flip").unwrap();
        assert!(rule.matches(&ctx(Method::GET, "flip=hello")));
        assert!(rule.matches(&ctx(Method::GET, "flip=")));
        assert!(rule.matches(&ctx(Method::GET, "flip=0")));
        assert!(rule.matches(&ctx(Method::GET, "flip")));
        assert!(!rule.matches(&ctx(Method::GET, "flop=1")));
        assert_eq!(MatchRule::param("").unwrap_err(), ConfigurationError::EmptyParam);
    }

    #[test]
    fn test_custom_rule() {
        let rule = MatchRule::custom("has_two_params", |ctx: &DispatchContext| ctx.params().len() == 2);
        assert_eq!(rule.kind(), RuleKind::Custom);
        assert!(rule.matches(&ctx(Method::GET, "a=1&b=2")));
        assert!(!rule.matches(&ctx(Method::GET, "a=1")));
        assert_eq!(rule.to_string(), "predicate=has_two_params");
    }
}
