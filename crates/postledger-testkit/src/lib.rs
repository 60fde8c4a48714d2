//! # Post Ledger Testkit
//!
//! Testing utilities for the Post Ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known notifications with their expected canonical bytes
//! - **Generators**: Proptest strategies for actors, bodies and operation sequences
//! - **Model**: A plain reference model that operation sequences are checked against
//! - **Fixtures**: A ready-made ledger with a manual clock
//!
//! ## Golden Vectors
//!
//! ```rust
//! use postledger_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! assert!(!all_vectors().is_empty());
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use postledger_testkit::generators::ledger_ops;
//!
//! proptest! {
//!     #[test]
//!     fn ops_match_model(ops in ledger_ops(4, 64)) {
//!         // apply to a ledger and to ModelLedger, compare
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use postledger_testkit::fixtures::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new().await;
//!     let author = fixture.actor("alice");
//!     fixture.ledger.create_post(&fixture.ctx(author), "hi").await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod model;
pub mod vectors;

pub use fixtures::{multi_party_actors, random_actor, ManualClock, TestFixture};
pub use generators::{ledger_ops, LedgerOp};
pub use model::{ModelLedger, Outcome};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector, VectorReport};
