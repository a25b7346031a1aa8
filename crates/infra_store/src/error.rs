//! Error types for the cache layer.

use thiserror::Error;

/// Cache layer errors.
///
/// # Examples
/// ```
/// use infra_store::StoreError;
///
/// let err = StoreError::InvalidPrefix(String::new());
/// assert!(err.to_string().contains("prefix"));
/// ```
#[derive(Debug, Error)]
pub enum StoreError {
    /// A payload or key structure could not be serialised.
    #[error("Serialisation error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key prefixes must be non-empty.
    #[error("Invalid cache key prefix: {0:?}")]
    InvalidPrefix(String),
}
