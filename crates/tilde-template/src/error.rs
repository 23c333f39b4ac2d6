//! Error types for reference resolution and evaluation.

use thiserror::Error;

/// Result type alias for tilde-template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while resolving or evaluating references.
///
/// Ordinary missing segments are not errors: evaluation yields `None` for them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// An ancestor-search reference names a key absent from the current path.
    #[error("{key} not found in the current template path: {path}")]
    PathNotFound {
        /// The ancestor key that was searched for.
        key: String,
        /// The absolute path that was searched.
        path: String,
    },
}

impl TemplateError {
    /// Create a path not found error.
    #[inline]
    pub fn path_not_found(key: impl Into<String>, path: impl Into<String>) -> Self {
        TemplateError::PathNotFound {
            key: key.into(),
            path: path.into(),
        }
    }
}
