//! Error types for tilde-runtime operations.

use thiserror::Error;
use tilde_state::StateError;
use tilde_template::TemplateError;

/// Result type alias for tilde-runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by reactions, data mapping, actions and document loading.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    State(#[from] StateError),

    /// A required mapping source has no value.
    #[error("required value not found in response data: {location}")]
    RequiredValueMissing { location: String },

    /// A mapping source location is empty.
    #[error("location is empty")]
    EmptyLocation,

    /// A document payload could not be decoded.
    #[error("invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// The transport could not complete a request.
    #[error("transport error: {0}")]
    Transport(String),

    /// A data processor or mapping processor failed.
    #[error("processor {name} failed: {reason}")]
    Processor { name: String, reason: String },
}

impl RuntimeError {
    #[inline]
    pub fn required_value_missing(location: impl Into<String>) -> Self {
        RuntimeError::RequiredValueMissing {
            location: location.into(),
        }
    }

    #[inline]
    pub fn transport(reason: impl Into<String>) -> Self {
        RuntimeError::Transport(reason.into())
    }

    #[inline]
    pub fn processor(name: impl Into<String>, reason: impl Into<String>) -> Self {
        RuntimeError::Processor {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RuntimeError::required_value_missing("user.id");
        assert_eq!(
            err.to_string(),
            "required value not found in response data: user.id"
        );

        let err = RuntimeError::processor("uppercase", "bad input");
        assert_eq!(err.to_string(), "processor uppercase failed: bad input");
    }

    #[test]
    fn test_wrapped_errors_stay_transparent() {
        let err: RuntimeError = TemplateError::path_not_found("k", "data.a").into();
        assert_eq!(
            err.to_string(),
            "k not found in the current template path: data.a"
        );

        let err: RuntimeError = StateError::outside_root("x", "data").into();
        assert!(matches!(err, RuntimeError::State(_)));
    }

    #[test]
    fn test_invalid_document_from_serde() {
        let err: RuntimeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("invalid document:"));
    }
}
