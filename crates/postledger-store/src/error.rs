//! Error types for the store module.

use postledger_core::{Actor, CoreError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Notification encoding/decoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] CoreError),

    /// Ledger settings have not been written yet.
    #[error("ledger settings not initialized")]
    NotInitialized,

    /// Post does not exist at the given position.
    #[error("no post at author {author} index {index}")]
    PostNotFound { author: Actor, index: u64 },

    /// Appended post id does not equal the author's list length.
    #[error("position conflict for author {author}: expected id {expected}, got {got}")]
    PositionConflict { author: Actor, expected: u64, got: u64 },

    /// Like count changed since the caller read it.
    #[error("like count conflict for author {author} index {index}: expected {expected}, found {found}")]
    LikeCountConflict {
        author: Actor,
        index: u64,
        expected: u64,
        found: u64,
    },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Lock poisoned or blocking task failed.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
