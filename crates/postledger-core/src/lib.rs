//! # Post Ledger Core
//!
//! Pure primitives for the Post Ledger: actors, posts, notifications and the
//! canonical encoding used to chain the notification log.
//!
//! This crate contains no I/O, no storage, no locking. It is pure computation
//! over the ledger's data model.
//!
//! ## Key Types
//!
//! - [`Actor`] - Opaque caller identity asserted by the host environment
//! - [`Post`] - One published message plus its like counter
//! - [`Notification`] - Description of a committed state change
//! - [`EventRecord`] - A notification placed in the hash-chained log
//! - [`LedgerSettings`] - Administrator and current post length bound
//!
//! ## Canonicalization
//!
//! Notifications are encoded using deterministic CBOR before hashing. See the
//! [`canonical`] module.

pub mod canonical;
pub mod error;
pub mod event;
pub mod post;
pub mod settings;
pub mod types;

pub use canonical::{canonical_notification_bytes, decode_notification};
pub use error::{CoreError, Result};
pub use event::{verify_chain, EventDigest, EventRecord, Notification, NotificationKind};
pub use post::{Post, PostId};
pub use settings::{LedgerSettings, DEFAULT_MAX_POST_LENGTH};
pub use types::Actor;
