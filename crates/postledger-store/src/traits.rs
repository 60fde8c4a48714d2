//! Store trait: the abstract interface for ledger persistence.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use postledger_core::{
    Actor, EventDigest, EventRecord, LedgerSettings, Notification, Post, PostId,
};

use crate::error::Result;

/// Result of writing the initial settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitResult {
    /// Settings were written.
    Initialized,
    /// Settings already existed and were left untouched.
    AlreadyInitialized(LedgerSettings),
}

/// The Store trait: async interface for ledger persistence.
///
/// # Design Notes
///
/// - **Atomic commits**: `append_post` and `set_like_count` write the state
///   change and its event record in one unit. A failed call changes nothing.
/// - **Event sequencing**: the store assigns each record the next `seq` and
///   chains its digest from the current log head.
/// - **Serialization**: the store does not validate business rules. Callers
///   serialize validate-then-commit spans themselves.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────────

    /// Load the ledger settings, if initialized.
    async fn load_settings(&self) -> Result<Option<LedgerSettings>>;

    /// Write the initial settings unless some already exist.
    async fn init_settings(&self, settings: &LedgerSettings) -> Result<InitResult>;

    /// Replace the post length bound.
    ///
    /// Returns `NotInitialized` if no settings exist.
    async fn set_max_post_length(&self, max_post_length: u32) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Posts
    // ─────────────────────────────────────────────────────────────────────────

    /// Number of posts by `author`.
    async fn post_count(&self, author: &Actor) -> Result<u64>;

    /// Get the post at `index` in `author`'s list.
    async fn get_post(&self, author: &Actor, index: PostId) -> Result<Option<Post>>;

    /// Get `author`'s whole list in creation order.
    async fn get_posts(&self, author: &Actor) -> Result<Vec<Post>>;

    /// All authors with at least one post.
    async fn list_authors(&self) -> Result<Vec<Actor>>;

    /// Append `post` to its author's list and record `notification`.
    ///
    /// # Returns
    /// - The committed event record.
    /// - `PositionConflict` if `post.id` is not the current list length.
    async fn append_post(
        &self,
        post: &Post,
        recorded_at: i64,
        notification: Notification,
    ) -> Result<EventRecord>;

    /// Move a post's like count from `expected` to `like_count` and record
    /// `notification`.
    ///
    /// # Returns
    /// - The committed event record.
    /// - `PostNotFound` if there is no post at that position.
    /// - `LikeCountConflict` if the stored count is not `expected`.
    async fn set_like_count(
        &self,
        author: &Actor,
        index: PostId,
        expected: u64,
        like_count: u64,
        recorded_at: i64,
        notification: Notification,
    ) -> Result<EventRecord>;

    // ─────────────────────────────────────────────────────────────────────────
    // Event log
    // ─────────────────────────────────────────────────────────────────────────

    /// Records with `seq > after_seq`, ordered by seq.
    async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>>;

    /// The last record's `(seq, digest)`, or `None` for an empty log.
    async fn event_head(&self) -> Result<Option<(u64, EventDigest)>>;
}
