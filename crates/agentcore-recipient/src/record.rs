//! `RecipientRecord` and the deterministic `recipientId` derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const RECIPIENT_ID_PREFIX: &str = "rcpt_";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipientRecord {
    pub recipient_id: String,
    pub channel: String,
    pub destination: String,
    pub registered_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// `"rcpt_" + lowercase_hex(first 8 bytes of sha256(channel NUL destination))`.
/// The `NUL` separator keeps `channel="a\0b"` from colliding with a
/// differently-split pair that happens to concatenate to the same bytes.
pub fn derive_recipient_id(channel: &str, destination: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(channel.as_bytes());
    hasher.update([0u8]);
    hasher.update(destination.as_bytes());
    let digest = hasher.finalize();
    let mut id = String::with_capacity(RECIPIENT_ID_PREFIX.len() + 16);
    id.push_str(RECIPIENT_ID_PREFIX);
    for byte in &digest[..8] {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}

pub fn has_valid_prefix(id: &str) -> bool {
    id.starts_with(RECIPIENT_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        assert_eq!(derive_recipient_id("sms", "+15551234"), derive_recipient_id("sms", "+15551234"));
    }

    #[test]
    fn nul_separator_prevents_split_ambiguity() {
        let a = derive_recipient_id("a\0b", "c");
        let b = derive_recipient_id("a", "b\0c");
        assert_ne!(a, b);
    }

    #[test]
    fn id_carries_prefix() {
        assert!(has_valid_prefix(&derive_recipient_id("sms", "x")));
        assert!(!has_valid_prefix("not-a-recipient-id"));
    }
}
