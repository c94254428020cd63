//! Network error types for wire and transport operations.

use thiserror::Error;

/// Errors that can occur while encoding, decoding, or moving datagrams.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload was not a token sentinel and did not decode as any
    /// known record shape.
    #[error("malformed message payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An encoded message would not fit in a single datagram.
    #[error("message size {actual} exceeds maximum {max}")]
    FrameTooLarge { actual: usize, max: usize },

    /// Socket-level failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for wire and transport operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
