//! Notifications and the hash-chained event log.
//!
//! Every committed mutation produces exactly one [`Notification`]. The store
//! wraps it in an [`EventRecord`] whose digest covers the previous record's
//! digest, so the log is ordered, append-only and tamper-evident.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::canonical_notification_bytes;
use crate::error::{CoreError, Result};
use crate::post::PostId;
use crate::types::Actor;

/// Domain separator for event digests.
pub const EVENT_DOMAIN: &[u8] = b"postledger-event-v0:";

/// Discriminator for notification variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NotificationKind {
    PostCreated = 0,
    PostLiked = 1,
    PostUnliked = 2,
}

impl NotificationKind {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            0 => Some(Self::PostCreated),
            1 => Some(Self::PostLiked),
            2 => Some(Self::PostUnliked),
            _ => None,
        }
    }
}

/// Description of a committed state change, for external subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// A post was appended to `author`'s list.
    PostCreated {
        id: PostId,
        author: Actor,
        body: String,
        created_at: i64,
    },

    /// `liker` liked `author`'s post at `index`.
    PostLiked {
        liker: Actor,
        author: Actor,
        index: PostId,
        like_count: u64,
    },

    /// `unliker` removed a like from `author`'s post at `index`.
    PostUnliked {
        unliker: Actor,
        author: Actor,
        index: PostId,
        like_count: u64,
    },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::PostCreated { .. } => NotificationKind::PostCreated,
            Notification::PostLiked { .. } => NotificationKind::PostLiked,
            Notification::PostUnliked { .. } => NotificationKind::PostUnliked,
        }
    }

    /// The author whose post list the change touched.
    pub fn author(&self) -> &Actor {
        match self {
            Notification::PostCreated { author, .. }
            | Notification::PostLiked { author, .. }
            | Notification::PostUnliked { author, .. } => author,
        }
    }

    /// The index of the post the change touched.
    pub fn index(&self) -> PostId {
        match self {
            Notification::PostCreated { id, .. } => *id,
            Notification::PostLiked { index, .. } | Notification::PostUnliked { index, .. } => {
                *index
            }
        }
    }
}

/// A 32-byte Blake3 digest identifying an event record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventDigest(pub [u8; 32]);

impl EventDigest {
    /// The digest preceding the first record.
    pub const ZERO: Self = Self([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for EventDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventDigest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for EventDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl TryFrom<&[u8]> for EventDigest {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> std::result::Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// A notification placed in the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 1.
    pub seq: u64,

    /// Host time of the call that produced the notification (Unix ms).
    pub recorded_at: i64,

    /// Digest of the previous record, or [`EventDigest::ZERO`] for seq 1.
    pub prev_digest: EventDigest,

    /// Digest over this record's contents and `prev_digest`.
    pub digest: EventDigest,

    pub notification: Notification,
}

impl EventRecord {
    /// Build the record that follows `prev` in the log.
    pub fn next(prev: Option<(u64, EventDigest)>, recorded_at: i64, notification: Notification) -> Self {
        let (seq, prev_digest) = match prev {
            Some((prev_seq, prev_digest)) => (prev_seq + 1, prev_digest),
            None => (1, EventDigest::ZERO),
        };
        let digest = Self::compute_digest(seq, recorded_at, &prev_digest, &notification);
        Self {
            seq,
            recorded_at,
            prev_digest,
            digest,
            notification,
        }
    }

    /// Digest = Blake3(domain || seq || recorded_at || prev_digest || canonical(notification)).
    pub fn compute_digest(
        seq: u64,
        recorded_at: i64,
        prev_digest: &EventDigest,
        notification: &Notification,
    ) -> EventDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(EVENT_DOMAIN);
        hasher.update(&seq.to_be_bytes());
        hasher.update(&recorded_at.to_be_bytes());
        hasher.update(&prev_digest.0);
        hasher.update(&canonical_notification_bytes(notification));
        EventDigest(*hasher.finalize().as_bytes())
    }

    /// The `(seq, digest)` pair the next record chains from.
    pub fn head(&self) -> (u64, EventDigest) {
        (self.seq, self.digest)
    }

    /// Whether the stored digest matches the record's contents.
    pub fn digest_matches(&self) -> bool {
        Self::compute_digest(self.seq, self.recorded_at, &self.prev_digest, &self.notification)
            == self.digest
    }
}

/// Verify a contiguous run of records.
///
/// `records` must start at seq 1 and be in order. Each record's digest must
/// match its contents and link to its predecessor.
pub fn verify_chain(records: &[EventRecord]) -> Result<()> {
    let mut expected_seq = 1u64;
    let mut expected_prev = EventDigest::ZERO;

    for record in records {
        if record.seq != expected_seq {
            return Err(CoreError::BrokenChain {
                seq: record.seq,
                reason: format!("expected seq {}", expected_seq),
            });
        }
        if record.prev_digest != expected_prev {
            return Err(CoreError::BrokenChain {
                seq: record.seq,
                reason: "prev_digest does not link to predecessor".into(),
            });
        }
        if !record.digest_matches() {
            return Err(CoreError::BrokenChain {
                seq: record.seq,
                reason: "digest does not match contents".into(),
            });
        }
        expected_seq += 1;
        expected_prev = record.digest;
    }

    Ok(())
}
