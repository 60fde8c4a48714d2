//! Global ledger settings.

use serde::{Deserialize, Serialize};

use crate::types::Actor;

/// Post length bound in force when a ledger is first initialized (bytes).
pub const DEFAULT_MAX_POST_LENGTH: u32 = 500;

/// The single process-wide configuration record of a ledger.
///
/// Created once at initialization. `administrator` never changes;
/// `max_post_length` changes only through the administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Identity allowed to tune `max_post_length`.
    pub administrator: Actor,

    /// Maximum byte length of a new post body.
    pub max_post_length: u32,
}

impl LedgerSettings {
    /// Settings for a freshly initialized ledger.
    pub fn new(administrator: Actor, max_post_length: u32) -> Self {
        Self {
            administrator,
            max_post_length,
        }
    }

    /// Whether `actor` is the administrator.
    pub fn is_administrator(&self, actor: &Actor) -> bool {
        self.administrator == *actor
    }

    /// Whether a body of this many bytes fits the current bound.
    pub fn admits(&self, body_len: usize) -> bool {
        body_len as u64 <= u64::from(self.max_post_length)
    }
}
