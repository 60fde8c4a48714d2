//! Canonical CBOR encoding for notifications.
//!
//! A notification is encoded as a CBOR map with small integer keys, following
//! RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! The same notification always produces identical bytes, which is what the
//! event log digest is computed over.

use ciborium::value::Value;

use crate::error::{CoreError, Result};
use crate::event::{Notification, NotificationKind};
use crate::types::Actor;

/// Map keys. Keys 0-23 encode as single bytes.
mod keys {
    pub const KIND: u64 = 0;
    pub const AUTHOR: u64 = 1;
    pub const INDEX: u64 = 2;
    pub const ACTOR: u64 = 3;
    pub const BODY: u64 = 4;
    pub const CREATED_AT: u64 = 5;
    pub const LIKE_COUNT: u64 = 6;
}

/// A value that can appear in a notification map.
enum Field<'a> {
    Uint(u64),
    Int(i64),
    Bytes(&'a [u8]),
    Text(&'a str),
}

/// Encode a notification to canonical CBOR bytes.
pub fn canonical_notification_bytes(notification: &Notification) -> Vec<u8> {
    let kind = Field::Uint(u64::from(notification.kind().to_u8()));
    let entries: Vec<(u64, Field<'_>)> = match notification {
        Notification::PostCreated {
            id,
            author,
            body,
            created_at,
        } => vec![
            (keys::KIND, kind),
            (keys::AUTHOR, Field::Bytes(&author.0)),
            (keys::INDEX, Field::Uint(*id)),
            (keys::BODY, Field::Text(body)),
            (keys::CREATED_AT, Field::Int(*created_at)),
        ],
        Notification::PostLiked {
            liker: actor,
            author,
            index,
            like_count,
        }
        | Notification::PostUnliked {
            unliker: actor,
            author,
            index,
            like_count,
        } => vec![
            (keys::KIND, kind),
            (keys::AUTHOR, Field::Bytes(&author.0)),
            (keys::INDEX, Field::Uint(*index)),
            (keys::ACTOR, Field::Bytes(&actor.0)),
            (keys::LIKE_COUNT, Field::Uint(*like_count)),
        ],
    };

    encode_map(&entries)
}

/// Encode an integer-keyed map.
///
/// Keys below 24 encode as one byte each, so numeric order is encoded byte
/// order.
fn encode_map(entries: &[(u64, Field<'_>)]) -> Vec<u8> {
    let mut sorted: Vec<&(u64, Field<'_>)> = entries.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let mut buf = Vec::new();
    encode_uint(&mut buf, 5, sorted.len() as u64);
    for (key, field) in sorted {
        encode_uint(&mut buf, 0, *key);
        match field {
            Field::Uint(n) => encode_uint(&mut buf, 0, *n),
            Field::Int(n) if *n >= 0 => encode_uint(&mut buf, 0, *n as u64),
            // CBOR encodes -1 as 0, -2 as 1, etc.
            Field::Int(n) => encode_uint(&mut buf, 1, (-1 - *n) as u64),
            Field::Bytes(b) => {
                encode_uint(&mut buf, 2, b.len() as u64);
                buf.extend_from_slice(b);
            }
            Field::Text(s) => {
                encode_uint(&mut buf, 3, s.len() as u64);
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }
    buf
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Decode a notification from canonical bytes.
///
/// Rejects input that decodes but does not re-encode to the same bytes.
pub fn decode_notification(bytes: &[u8]) -> Result<Notification> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedNotification("expected map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == i128::from(key)))
            .map(|(_, v)| v)
    };

    let kind_raw = get_u64(get(keys::KIND), "kind")?;
    let kind = u8::try_from(kind_raw)
        .ok()
        .and_then(NotificationKind::from_u8)
        .ok_or_else(|| CoreError::MalformedNotification(format!("unknown kind {}", kind_raw)))?;

    let author = get_actor(get(keys::AUTHOR), "author")?;
    let index = get_u64(get(keys::INDEX), "index")?;

    let notification = match kind {
        NotificationKind::PostCreated => Notification::PostCreated {
            id: index,
            author,
            body: match get(keys::BODY) {
                Some(Value::Text(s)) => s.clone(),
                _ => return Err(CoreError::MalformedNotification("invalid body".into())),
            },
            created_at: get_i64(get(keys::CREATED_AT), "created_at")?,
        },
        NotificationKind::PostLiked => Notification::PostLiked {
            liker: get_actor(get(keys::ACTOR), "liker")?,
            author,
            index,
            like_count: get_u64(get(keys::LIKE_COUNT), "like_count")?,
        },
        NotificationKind::PostUnliked => Notification::PostUnliked {
            unliker: get_actor(get(keys::ACTOR), "unliker")?,
            author,
            index,
            like_count: get_u64(get(keys::LIKE_COUNT), "like_count")?,
        },
    };

    if canonical_notification_bytes(&notification) != bytes {
        return Err(CoreError::MalformedNotification(
            "non-canonical encoding".into(),
        ));
    }

    Ok(notification)
}

fn get_u64(value: Option<&Value>, field: &str) -> Result<u64> {
    match value {
        Some(Value::Integer(i)) => u64::try_from(*i)
            .map_err(|_| CoreError::MalformedNotification(format!("{} out of range", field))),
        _ => Err(CoreError::MalformedNotification(format!("missing {}", field))),
    }
}

fn get_i64(value: Option<&Value>, field: &str) -> Result<i64> {
    match value {
        Some(Value::Integer(i)) => i64::try_from(*i)
            .map_err(|_| CoreError::MalformedNotification(format!("{} out of range", field))),
        _ => Err(CoreError::MalformedNotification(format!("missing {}", field))),
    }
}

fn get_actor(value: Option<&Value>, field: &str) -> Result<Actor> {
    match value {
        Some(Value::Bytes(b)) => Actor::try_from(b.as_slice())
            .map_err(|_| CoreError::MalformedNotification(format!("invalid {}", field))),
        _ => Err(CoreError::MalformedNotification(format!("missing {}", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_encoding_is_stable() {
        let n = Notification::PostCreated {
            id: 0,
            author: Actor::from_bytes([0x11; 32]),
            body: "hello".into(),
            created_at: 1_700_000_000_000,
        };
        let a = canonical_notification_bytes(&n);
        let b = canonical_notification_bytes(&n.clone());
        assert_eq!(a, b);
        // map(5), key 0, kind 0
        assert_eq!(&a[..3], &[0xa5, 0x00, 0x00]);
        assert_eq!(decode_notification(&a).unwrap(), n);
    }

    #[test]
    fn test_negative_timestamp_decodes() {
        let n = Notification::PostCreated {
            id: 300,
            author: Actor::from_bytes([0x22; 32]),
            body: String::new(),
            created_at: -5,
        };
        let bytes = canonical_notification_bytes(&n);
        assert_eq!(decode_notification(&bytes).unwrap(), n);
    }

    #[test]
    fn test_liked_and_unliked_differ_only_by_kind() {
        let author = Actor::from_bytes([0x01; 32]);
        let actor = Actor::from_bytes([0x02; 32]);
        let liked = Notification::PostLiked {
            liker: actor,
            author,
            index: 4,
            like_count: 1,
        };
        let unliked = Notification::PostUnliked {
            unliker: actor,
            author,
            index: 4,
            like_count: 1,
        };
        let lb = canonical_notification_bytes(&liked);
        let ub = canonical_notification_bytes(&unliked);
        assert_eq!(lb.len(), ub.len());
        assert_ne!(lb, ub);
        assert_eq!(decode_notification(&ub).unwrap(), unliked);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_notification(&[0xff, 0x00]).is_err());
        // A CBOR array instead of a map.
        assert!(decode_notification(&[0x80]).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        // {0: 7}
        assert!(matches!(
            decode_notification(&[0xa1, 0x00, 0x07]),
            Err(CoreError::MalformedNotification(_))
        ));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn created_decodes_to_itself(
                id in any::<u64>(),
                seed in any::<u8>(),
                body in ".{0,40}",
                created_at in any::<i64>(),
            ) {
                let n = Notification::PostCreated {
                    id,
                    author: Actor::from_bytes([seed; 32]),
                    body,
                    created_at,
                };
                let bytes = canonical_notification_bytes(&n);
                prop_assert_eq!(decode_notification(&bytes).unwrap(), n);
            }
        }
    }
}
