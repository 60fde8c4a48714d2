//! Per-call context supplied by the host environment.

use postledger_core::Actor;

/// Who is calling and when.
///
/// The ledger trusts both fields: `actor` has already been authenticated by
/// the host, and `now` is expected never to go backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub actor: Actor,

    /// Host time in Unix milliseconds.
    pub now: i64,
}

impl CallContext {
    pub fn new(actor: Actor, now: i64) -> Self {
        Self { actor, now }
    }
}
