//! Error types for tilde-state operations.

use thiserror::Error;
use tilde_template::TemplateError;

/// Result type alias for tilde-state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while writing to a store.
///
/// Structurally odd updates are not errors: they are no-ops reported as
/// [`crate::UpdateOutcome::Unchanged`].
#[derive(Debug, Error)]
pub enum StateError {
    /// A reference could not be resolved.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// An absolute path does not start at the store root.
    #[error("path {path} is outside of the store root {root}")]
    OutsideRoot {
        /// The offending absolute path.
        path: String,
        /// The root segment of the store.
        root: String,
    },

    /// The shared store could not be accessed.
    #[error("store unavailable: {reason}")]
    StoreUnavailable {
        /// Why access failed.
        reason: String,
    },
}

impl StateError {
    /// Create an outside root error.
    #[inline]
    pub fn outside_root(path: impl Into<String>, root: impl Into<String>) -> Self {
        StateError::OutsideRoot {
            path: path.into(),
            root: root.into(),
        }
    }

    /// Create a store unavailable error.
    #[inline]
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        StateError::StoreUnavailable {
            reason: reason.into(),
        }
    }
}

/// Get the type name of a JSON value.
#[inline]
pub fn value_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StateError::outside_root("other.x", "data");
        assert_eq!(err.to_string(), "path other.x is outside of the store root data");

        let err: StateError = TemplateError::path_not_found("k", "data.a").into();
        assert_eq!(
            err.to_string(),
            "k not found in the current template path: data.a"
        );
    }

    #[test]
    fn test_value_type_name() {
        use serde_json::json;

        assert_eq!(value_type_name(&json!(null)), "null");
        assert_eq!(value_type_name(&json!(true)), "boolean");
        assert_eq!(value_type_name(&json!(42)), "number");
        assert_eq!(value_type_name(&json!("hello")), "string");
        assert_eq!(value_type_name(&json!([1, 2, 3])), "array");
        assert_eq!(value_type_name(&json!({"a": 1})), "object");
    }
}
