//! # Post Ledger Store
//!
//! Storage abstraction for the Post Ledger. Provides a trait-based interface
//! for settings, per-author post lists and the notification log, with SQLite
//! and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests and ephemeral hosts
//! - [`InitResult`] - Result of writing the initial settings
//!
//! ## Usage
//!
//! ```rust,no_run
//! use postledger_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let settings = store.load_settings().await.unwrap();
//!     assert!(settings.is_none());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Commit units**: a post append or like-count change is written together
//!   with its event record, or not at all
//! - **Id-as-position**: appending a post whose id is not the current list
//!   length returns `PositionConflict`
//! - **No deletion**: the trait has no operation that shrinks a post list

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InitResult, Store};
