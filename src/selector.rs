//! Type selection: extracting a message's type tag.

use crate::types::Message;
use std::fmt;
use std::sync::Arc;

/// Extracts the type tag a message is matched against.
///
/// Selection must be pure; it runs on every dealt and pulled message.
/// A message for which selection yields `None` (missing field, non-string
/// value) is treated as unmatched and routed per the configured
/// [`UnmatchedPolicy`](crate::dispatcher::UnmatchedPolicy).
#[derive(Clone)]
pub enum TypeSelector {
    /// Index the message by a field name. The default is `"type"`.
    Field(String),
    /// Arbitrary selection function.
    Func(Arc<dyn Fn(&Message) -> Option<String> + Send + Sync>),
}

impl TypeSelector {
    /// Selector reading the given top-level field.
    pub fn field(name: impl Into<String>) -> Self {
        TypeSelector::Field(name.into())
    }

    /// Selector from an arbitrary function.
    pub fn func(f: impl Fn(&Message) -> Option<String> + Send + Sync + 'static) -> Self {
        TypeSelector::Func(Arc::new(f))
    }

    /// Extract the type tag from a message.
    pub fn select(&self, message: &Message) -> Option<String> {
        match self {
            TypeSelector::Field(name) => message
                .get(name)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            TypeSelector::Func(f) => f(message),
        }
    }
}

impl Default for TypeSelector {
    fn default() -> Self {
        TypeSelector::Field("type".to_string())
    }
}

impl fmt::Debug for TypeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSelector::Field(name) => write!(f, "TypeSelector::Field({:?})", name),
            TypeSelector::Func(_) => f.write_str("TypeSelector::Func(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_reads_type_field() {
        let selector = TypeSelector::default();
        assert_eq!(
            selector.select(&json!({"type": "order", "id": 7})),
            Some("order".to_string())
        );
    }

    #[test]
    fn test_custom_field() {
        let selector = TypeSelector::field("class");
        assert_eq!(
            selector.select(&json!({"class": "x"})),
            Some("x".to_string())
        );
        // The conventional field is ignored once another is configured
        assert_eq!(selector.select(&json!({"type": "x"})), None);
    }

    #[test]
    fn test_missing_or_non_string_field() {
        let selector = TypeSelector::default();
        assert_eq!(selector.select(&json!({"kind": "x"})), None);
        assert_eq!(selector.select(&json!({"type": 42})), None);
        assert_eq!(selector.select(&json!(null)), None);
    }

    #[test]
    fn test_function_selector() {
        let selector = TypeSelector::func(|m| {
            m.get("topic")
                .and_then(|v| v.as_str())
                .map(|s| s.to_uppercase())
        });
        assert_eq!(
            selector.select(&json!({"topic": "audit"})),
            Some("AUDIT".to_string())
        );
    }
}
