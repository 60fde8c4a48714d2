//! Reference model for operation sequences.
//!
//! `ModelLedger` is the ledger's contract written as plain data: a vector of
//! like counts per author and a counter of notifications. Property tests run
//! the same [`LedgerOp`]s against it and against a real ledger and compare.

use std::collections::HashMap;

use postledger::{Actor, CallContext, ErrorKind, PostId, PostLedger};
use postledger_store::Store;

use crate::generators::LedgerOp;

/// What an operation did, reduced to comparable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created(PostId),
    Liked(u64),
    Unliked(u64),
    BoundSet,
    Rejected(ErrorKind),
}

impl Outcome {
    /// Whether the operation should have appended a notification.
    pub fn emits_notification(&self) -> bool {
        matches!(
            self,
            Outcome::Created(_) | Outcome::Liked(_) | Outcome::Unliked(_)
        )
    }
}

/// Plain reference model of a ledger.
#[derive(Debug, Clone)]
pub struct ModelLedger {
    pub administrator: Actor,
    pub max_post_length: u32,
    /// Like counts per author, indexed by post id.
    pub likes: HashMap<Actor, Vec<u64>>,
    pub notifications: u64,
}

impl ModelLedger {
    pub fn new(administrator: Actor, max_post_length: u32) -> Self {
        Self {
            administrator,
            max_post_length,
            likes: HashMap::new(),
            notifications: 0,
        }
    }

    pub fn post_count(&self, author: &Actor) -> u64 {
        self.likes.get(author).map(|l| l.len() as u64).unwrap_or(0)
    }

    /// Apply `op` with slots resolved against `actors`.
    pub fn apply(&mut self, op: &LedgerOp, actors: &[Actor]) -> Outcome {
        let outcome = match *op {
            LedgerOp::Create { caller, body_len } => {
                if body_len as u64 > u64::from(self.max_post_length) {
                    Outcome::Rejected(ErrorKind::InvalidArgument)
                } else {
                    let list = self.likes.entry(actors[caller]).or_default();
                    list.push(0);
                    Outcome::Created(list.len() as u64 - 1)
                }
            }
            LedgerOp::Like { author, index, .. } => {
                match self.slot(&actors[author], index) {
                    Some(count) => {
                        *count += 1;
                        Outcome::Liked(*count)
                    }
                    None => Outcome::Rejected(ErrorKind::NotFound),
                }
            }
            LedgerOp::Unlike { author, index, .. } => {
                match self.slot(&actors[author], index) {
                    Some(0) => Outcome::Rejected(ErrorKind::InvalidState),
                    Some(count) => {
                        *count -= 1;
                        Outcome::Unliked(*count)
                    }
                    None => Outcome::Rejected(ErrorKind::NotFound),
                }
            }
            LedgerOp::SetMaxPostLength { caller, new_length } => {
                if actors[caller] == self.administrator {
                    self.max_post_length = new_length;
                    Outcome::BoundSet
                } else {
                    Outcome::Rejected(ErrorKind::Unauthorized)
                }
            }
        };

        if outcome.emits_notification() {
            self.notifications += 1;
        }
        outcome
    }

    fn slot(&mut self, author: &Actor, index: PostId) -> Option<&mut u64> {
        let i = usize::try_from(index).ok()?;
        self.likes.get_mut(author).and_then(|l| l.get_mut(i))
    }
}

/// Body of exactly `len` bytes.
pub fn body_of_len(len: usize) -> String {
    "x".repeat(len)
}

/// Apply `op` to a real ledger, with slots resolved against `actors`.
///
/// Store or encoding failures are returned as `Err`; rule violations come
/// back as `Outcome::Rejected`.
pub async fn apply_to_ledger<S: Store>(
    ledger: &PostLedger<S>,
    op: &LedgerOp,
    actors: &[Actor],
    now: i64,
) -> postledger::Result<Outcome> {
    let result = match *op {
        LedgerOp::Create { caller, body_len } => ledger
            .create_post(&CallContext::new(actors[caller], now), &body_of_len(body_len))
            .await
            .map(Outcome::Created),
        LedgerOp::Like {
            caller,
            author,
            index,
        } => ledger
            .like_post(&CallContext::new(actors[caller], now), &actors[author], index)
            .await
            .map(Outcome::Liked),
        LedgerOp::Unlike {
            caller,
            author,
            index,
        } => ledger
            .unlike_post(&CallContext::new(actors[caller], now), &actors[author], index)
            .await
            .map(Outcome::Unliked),
        LedgerOp::SetMaxPostLength { caller, new_length } => ledger
            .set_max_post_length(&CallContext::new(actors[caller], now), new_length)
            .await
            .map(|()| Outcome::BoundSet),
    };

    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.kind() == ErrorKind::Internal => Err(e),
        Err(e) => Ok(Outcome::Rejected(e.kind())),
    }
}
