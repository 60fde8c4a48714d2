//! # Post Ledger
//!
//! A minimal append-only content ledger. Actors publish short text posts,
//! which are recorded per author and can be liked or unliked by anyone. One
//! administrator may tune the maximum post length.
//!
//! ## Key Concepts
//!
//! - **Post**: Immutable once created, except for its like counter.
//! - **Author ledger**: Each author's posts, in creation order. A post's id is
//!   its position and lists never shrink.
//! - **Actor**: The caller identity, asserted by the host. The ledger only
//!   compares identities, it never authenticates them.
//! - **Notification**: One per successful create/like/unlike, appended to a
//!   hash-chained log in the same commit as the state change.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use postledger::{Actor, CallContext, LedgerConfig, PostLedger};
//! use postledger::store::SqliteStore;
//!
//! async fn example() {
//!     let admin = Actor::derive("admin");
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!     let ledger = PostLedger::init(store, admin, LedgerConfig::default())
//!         .await
//!         .unwrap();
//!
//!     let alice = Actor::derive("alice");
//!     let id = ledger
//!         .create_post(&CallContext::new(alice, 1_700_000_000_000), "hello")
//!         .await
//!         .unwrap();
//!
//!     let bob = CallContext::new(Actor::derive("bob"), 1_700_000_000_500);
//!     ledger.like_post(&bob, &alice, id).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `postledger::core` - Core types (Actor, Post, Notification, etc.)
//! - `postledger::store` - Storage abstraction and SQLite

pub mod config;
pub mod context;
pub mod error;
pub mod ledger;

// Re-export component crates
pub use postledger_core as core;
pub use postledger_store as store;

// Re-export main types for convenience
pub use config::LedgerConfig;
pub use context::CallContext;
pub use error::{ErrorKind, LedgerError, Result};
pub use ledger::PostLedger;

// Re-export commonly used core types
pub use postledger_core::{
    Actor, EventDigest, EventRecord, LedgerSettings, Notification, NotificationKind, Post,
    PostId, DEFAULT_MAX_POST_LENGTH,
};
