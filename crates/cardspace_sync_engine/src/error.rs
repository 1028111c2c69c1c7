//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// None of these are fatal to the session: a failed attempt leaves the
/// replica untouched and the next trigger tries again.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Protocol error (invalid message format).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote store rejected the owner's credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The remote store rejected the request.
    #[error("server error: {0}")]
    ServerError(String),

    /// Local replica error during write-back.
    #[error("replica error: {0}")]
    Core(#[from] cardspace_core::CoreError),

    /// Gateway has been closed.
    #[error("not connected to remote store")]
    NotConnected,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the remote store could not be reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport { .. } | SyncError::NotConnected)
    }

    /// Returns true if a later attempt may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::ServerError(_) => true,
            _ => false,
        }
    }
}

impl From<cardspace_sync_protocol::ProtocolError> for SyncError {
    fn from(err: cardspace_sync_protocol::ProtocolError) -> Self {
        SyncError::Protocol(err.to_string())
    }
}
