//! Error types for Cardspace core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Cardspace core operations.
///
/// Commands themselves never fail; these errors come from persisting or
/// decoding the workspace.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Local storage error.
    #[error("storage error: {0}")]
    Storage(#[from] cardspace_storage::StorageError),

    /// Snapshot could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot decoded but violates a model invariant.
    #[error("invalid snapshot: {message}")]
    InvalidSnapshot {
        /// Description of the violation.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid-snapshot error.
    pub fn invalid_snapshot(message: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            message: message.into(),
        }
    }
}
