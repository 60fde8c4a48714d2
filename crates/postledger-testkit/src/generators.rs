//! Proptest generators for property-based testing.

use proptest::prelude::*;

use postledger::Actor;

/// One ledger call, with actors named by slot in an actor pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOp {
    Create { caller: usize, body_len: usize },
    Like { caller: usize, author: usize, index: u64 },
    Unlike { caller: usize, author: usize, index: u64 },
    SetMaxPostLength { caller: usize, new_length: u32 },
}

/// Generate a random actor.
pub fn actor() -> impl Strategy<Value = Actor> {
    any::<[u8; 32]>().prop_map(Actor::from_bytes)
}

/// Generate a post body of at most `max_chars` characters (any script).
pub fn body(max_chars: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 0..=max_chars).prop_map(|c| c.into_iter().collect())
}

/// Generate a single operation over a pool of `actors` slots.
///
/// Indexes stay small so that hits and out-of-range misses both occur.
pub fn ledger_op(actors: usize, max_body_len: usize) -> impl Strategy<Value = LedgerOp> {
    let slot = 0..actors;
    let index = 0u64..4;
    prop_oneof![
        3 => (slot.clone(), 0..=max_body_len)
            .prop_map(|(caller, body_len)| LedgerOp::Create { caller, body_len }),
        4 => (slot.clone(), slot.clone(), index.clone())
            .prop_map(|(caller, author, index)| LedgerOp::Like { caller, author, index }),
        3 => (slot.clone(), slot.clone(), index)
            .prop_map(|(caller, author, index)| LedgerOp::Unlike { caller, author, index }),
        1 => (slot, 0u32..=(max_body_len as u32))
            .prop_map(|(caller, new_length)| LedgerOp::SetMaxPostLength { caller, new_length }),
    ]
}

/// Generate a sequence of up to `max_ops` operations.
pub fn ledger_ops(actors: usize, max_ops: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
    prop::collection::vec(ledger_op(actors, 24), 0..=max_ops)
}
