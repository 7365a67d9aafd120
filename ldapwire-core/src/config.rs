//! Codec configuration

use crate::error::{LdapError, LdapResult};
use serde::{Deserialize, Serialize};

/// OID of the StartTLS-style generic unsolicited notification
pub const DEFAULT_UNSOLICITED_NOTIFICATION_OID: &str = "1.3.6.1.4.1.1466.20037";

/// Limits and dispatch tables used when decoding server messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest inbound buffer the dispatcher accepts, in bytes
    pub max_message_size: usize,
    /// Deepest TLV nesting the parse engine descends into
    pub max_depth: usize,
    /// Extended-response names re-materialized as unsolicited notifications
    pub unsolicited_notification_oids: Vec<String>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_message_size: 16 * 1024 * 1024,
            max_depth: 32,
            unsolicited_notification_oids: vec![DEFAULT_UNSOLICITED_NOTIFICATION_OID.to_string()],
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> LdapResult<()> {
        if self.max_message_size == 0 {
            return Err(LdapError::Config(
                "max_message_size must be greater than zero".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(LdapError::Config("max_depth must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Whether an extended-response name is configured as unsolicited
    pub fn is_unsolicited_notification(&self, oid: &str) -> bool {
        self.unsolicited_notification_oids.iter().any(|o| o == oid)
    }
}
