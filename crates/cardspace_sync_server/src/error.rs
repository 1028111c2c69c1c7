//! Error types for the sync server.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or malformed credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Valid credentials for a different owner.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Document exceeds a configured limit.
    #[error("document too large: {cards} cards, limit {limit}")]
    TooLarge {
        /// Cards in the request.
        cards: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// Document storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] cardspace_storage::StorageError),

    /// Stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::AuthenticationFailed(_)
                | ServerError::NotAuthorized(_)
                | ServerError::TooLarge { .. }
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::AuthenticationFailed(_) => 401,
            ServerError::NotAuthorized(_) => 403,
            ServerError::TooLarge { .. } => 413,
            ServerError::Storage(_) | ServerError::Serialization(_) | ServerError::Internal(_) => {
                500
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServerError::Internal("oops".into()).is_server_error());
        assert!(!ServerError::InvalidRequest("bad".into()).is_server_error());
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ServerError::AuthenticationFailed("x".into()).status_code(),
            401
        );
        assert_eq!(ServerError::NotAuthorized("x".into()).status_code(), 403);
        let err = ServerError::TooLarge {
            cards: 12,
            limit: 10,
        };
        assert_eq!(err.status_code(), 413);
        assert!(err.to_string().contains("12"));
    }
}
