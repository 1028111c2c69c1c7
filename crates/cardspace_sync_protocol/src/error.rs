//! Protocol errors.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A message could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Bytes could not be decoded as the expected message.
    #[error("decode error: {0}")]
    Decode(String),

    /// A message arrived where a different one was expected.
    #[error("unexpected message: expected {expected}, got {actual}")]
    UnexpectedMessage {
        /// Expected message name.
        expected: &'static str,
        /// Received message name.
        actual: &'static str,
    },
}
