//! Error types for the Post Ledger core.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or verifying core values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("malformed notification: {0}")]
    MalformedNotification(String),

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("event chain broken at seq {seq}: {reason}")]
    BrokenChain { seq: u64, reason: String },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
