//! Golden test vectors for deterministic verification.
//!
//! Each vector pins the canonical bytes of one notification. Any change to
//! key numbering, field order or integer width breaks these, and with them
//! every digest already written to an existing event log.

use serde::Serialize;

use postledger_core::{canonical_notification_bytes, decode_notification};
use postledger::{Actor, Notification};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub notification: Notification,
    /// Expected canonical CBOR (hex).
    pub expected_hex: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    let author = Actor::from_bytes([0x11; 32]);
    let fan = Actor::from_bytes([0x22; 32]);

    vec![
        GoldenVector {
            name: "PostCreated hello",
            notification: Notification::PostCreated {
                id: 0,
                author,
                body: "hello".to_string(),
                created_at: 1_736_870_400_000, // 2025-01-14T16:00:00Z
            },
            expected_hex: "a5000001582011111111111111111111111111111111111111111111111111111111111111110200046568656c6c6f051b00000194658b1000",
        },
        GoldenVector {
            name: "PostLiked first like",
            notification: Notification::PostLiked {
                liker: fan,
                author,
                index: 0,
                like_count: 1,
            },
            expected_hex: "a500010158201111111111111111111111111111111111111111111111111111111111111111020003582022222222222222222222222222222222222222222222222222222222222222220601",
        },
        GoldenVector {
            name: "PostUnliked two-byte index",
            notification: Notification::PostUnliked {
                unliker: fan,
                author,
                index: 300,
                like_count: 0,
            },
            expected_hex: "a5000201582011111111111111111111111111111111111111111111111111111111111111110219012c03582022222222222222222222222222222222222222222222222222222222222222220600",
        },
        GoldenVector {
            name: "PostCreated empty body, negative time",
            notification: Notification::PostCreated {
                id: 24,
                author: Actor::from_bytes([0x33; 32]),
                body: String::new(),
                created_at: -1,
            },
            expected_hex: "a50000015820333333333333333333333333333333333333333333333333333333333333333302181804600520",
        },
    ]
}

/// Outcome of checking one vector.
#[derive(Debug, Clone, Serialize)]
pub struct VectorReport {
    pub name: String,
    pub matches: bool,
    pub actual_hex: String,
}

/// Encode every vector and report what each produced.
pub fn vector_reports() -> Vec<VectorReport> {
    all_vectors()
        .iter()
        .map(|v| {
            let actual_hex = hex::encode(canonical_notification_bytes(&v.notification));
            VectorReport {
                name: v.name.to_string(),
                matches: actual_hex == v.expected_hex,
                actual_hex,
            }
        })
        .collect()
}

/// Reports as pretty JSON, for diffing against another implementation.
pub fn reports_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&vector_reports())
}

/// Verify every vector encodes to its expected bytes and decodes back.
pub fn verify_all_vectors() -> Result<(), String> {
    for v in all_vectors() {
        let bytes = canonical_notification_bytes(&v.notification);
        let actual = hex::encode(&bytes);
        if actual != v.expected_hex {
            return Err(format!(
                "vector '{}': expected {}, got {}",
                v.name, v.expected_hex, actual
            ));
        }
        let decoded = decode_notification(&bytes)
            .map_err(|e| format!("vector '{}': decode failed: {e}", v.name))?;
        if decoded != v.notification {
            return Err(format!("vector '{}': decoded value differs", v.name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use postledger::EventRecord;

    #[test]
    fn test_golden_vectors() {
        verify_all_vectors().unwrap();
        assert!(vector_reports().iter().all(|r| r.matches));
    }

    #[test]
    fn test_reports_json_lists_every_vector() {
        let json = reports_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), all_vectors().len());
    }

    #[test]
    fn test_vector_digests_chain_deterministically() {
        let build = || {
            let mut head = None;
            let mut records = Vec::new();
            for (i, v) in all_vectors().into_iter().enumerate() {
                let record = EventRecord::next(head, i as i64, v.notification);
                head = Some(record.head());
                records.push(record);
            }
            records
        };

        let a = build();
        let b = build();
        assert_eq!(a, b);
        postledger_core::verify_chain(&a).unwrap();
    }
}
