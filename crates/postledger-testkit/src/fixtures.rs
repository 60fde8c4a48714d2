//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicI64, Ordering};

use postledger::{Actor, CallContext, LedgerConfig, PostLedger};
use postledger_store::MemoryStore;

/// Start of fixture time: 2025-01-14T16:00:00Z in Unix ms.
pub const FIXTURE_EPOCH: i64 = 1_736_870_400_000;

/// A monotonic clock that advances one millisecond per reading.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn starting_at(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Current reading without advancing.
    pub fn peek(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    /// Return the current reading and advance by 1 ms.
    pub fn tick(&self) -> i64 {
        self.now.fetch_add(1, Ordering::SeqCst)
    }

    /// Jump forward by `ms`.
    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(FIXTURE_EPOCH)
    }
}

/// A test fixture with an initialized in-memory ledger.
pub struct TestFixture {
    pub admin: Actor,
    pub ledger: PostLedger<MemoryStore>,
    pub clock: ManualClock,
}

impl TestFixture {
    /// Ledger with the default configuration and administrator "admin".
    pub async fn new() -> Self {
        Self::with_config(LedgerConfig::default()).await
    }

    /// Ledger with a custom configuration.
    ///
    /// Panics if initialization fails; this is test setup.
    pub async fn with_config(config: LedgerConfig) -> Self {
        let admin = Actor::derive("admin");
        let ledger = PostLedger::init(MemoryStore::new(), admin, config)
            .await
            .expect("fresh memory store must initialize");
        Self {
            admin,
            ledger,
            clock: ManualClock::default(),
        }
    }

    /// Deterministic actor for a label.
    pub fn actor(&self, name: &str) -> Actor {
        Actor::derive(name)
    }

    /// Call context for `actor` at the next clock reading.
    pub fn ctx(&self, actor: Actor) -> CallContext {
        CallContext::new(actor, self.clock.tick())
    }

    /// Call context for the administrator.
    pub fn admin_ctx(&self) -> CallContext {
        self.ctx(self.admin)
    }
}

/// Deterministic, distinct actors for multi-party tests.
pub fn multi_party_actors(count: usize) -> Vec<Actor> {
    (0..count)
        .map(|i| {
            let mut bytes = [0u8; 32];
            bytes[..8].copy_from_slice(&(i as u64).to_be_bytes());
            Actor::from_bytes(bytes)
        })
        .collect()
}

/// A fresh random actor.
pub fn random_actor() -> Actor {
    Actor::from_bytes(rand::random())
}
