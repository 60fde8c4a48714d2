//! Error types for the ledger.

use postledger_core::CoreError;
use postledger_store::StoreError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
///
/// Every error leaves the ledger unchanged and emits no notification.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller is not the identity the operation requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A supplied value violates a stateless precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The author/index pair does not name an existing post.
    #[error("not found: {0}")]
    NotFound(String),

    /// The call is well formed but the current state forbids it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Encoding or verification error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    InvalidArgument,
    NotFound,
    InvalidState,
    /// Storage, encoding or configuration failure.
    Internal,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Unauthorized(_) => ErrorKind::Unauthorized,
            LedgerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            LedgerError::NotFound(_) | LedgerError::Store(StoreError::PostNotFound { .. }) => {
                ErrorKind::NotFound
            }
            LedgerError::InvalidState(_) => ErrorKind::InvalidState,
            LedgerError::Config(_) | LedgerError::Store(_) | LedgerError::Core(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
