//! Ledger configuration.

use serde::{Deserialize, Serialize};

use postledger_core::DEFAULT_MAX_POST_LENGTH;

use crate::error::{LedgerError, Result};

/// Configuration for a [`PostLedger`](crate::PostLedger).
///
/// Missing fields in JSON fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Post length bound written at initialization (bytes).
    pub default_max_post_length: u32,

    /// Whether `open` re-verifies the event hash chain.
    pub verify_log_on_open: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_max_post_length: DEFAULT_MAX_POST_LENGTH,
            verify_log_on_open: true,
        }
    }
}

impl LedgerConfig {
    /// Parse from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bound_is_500() {
        assert_eq!(LedgerConfig::default().default_max_post_length, 500);
    }

    #[test]
    fn test_from_json_partial() {
        let config = LedgerConfig::from_json(r#"{"default_max_post_length": 280}"#).unwrap();
        assert_eq!(config.default_max_post_length, 280);
        assert!(config.verify_log_on_open);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        let err = LedgerConfig::from_json(r#"{"default_max_post_length": -1}"#).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
