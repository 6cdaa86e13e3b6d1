//! Domain primitives: Address, TxHash.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contract or wallet address (`0x` + 40 hex chars), kept as written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address {0:?}: expected 0x followed by 40 hex characters")]
pub struct AddressParseError(pub String);

impl Address {
    /// Parse and validate an address string.
    pub fn parse(addr: &str) -> Result<Self, AddressParseError> {
        let trimmed = addr.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError(addr.to_string()))?;
        if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError(addr.to_string()));
        }
        Ok(Address(format!("0x{}", body)))
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digits without the `0x` prefix, lowercased.
    pub fn hex_body(&self) -> String {
        self.0[2..].to_ascii_lowercase()
    }

    /// The address left-padded to a 32-byte indexed topic.
    pub fn to_topic(&self) -> String {
        format!("0x{:0>64}", self.hex_body())
    }

    /// Case-insensitive comparison (checksummed vs lowercase forms).
    pub fn same_as(&self, other: &Address) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

/// Transaction hash as reported by the node.
///
/// Stored verbatim; identity comparisons go through [`TxHash::dedup_key`] so
/// the same hash in different letter case is one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        TxHash(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn dedup_key(&self) -> String {
        self.0.trim().to_ascii_lowercase()
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TxHash {
    fn from(value: &str) -> Self {
        TxHash::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_valid() {
        let addr = Address::parse("0x878b7897C60fA51c2A7bfBdd4E3cB5708D9eEE43").unwrap();
        assert_eq!(addr.as_str(), "0x878b7897C60fA51c2A7bfBdd4E3cB5708D9eEE43");
    }

    #[test]
    fn test_address_parse_rejects_bad_input() {
        assert!(Address::parse("").is_err());
        assert!(Address::parse("878b7897C60fA51c2A7bfBdd4E3cB5708D9eEE43").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xZZ8b7897C60fA51c2A7bfBdd4E3cB5708D9eEE43").is_err());
    }

    #[test]
    fn test_address_topic_is_padded_lowercase() {
        let addr = Address::parse("0x6833df4E1edB361A04491349833c83A4868ABCdA").unwrap();
        assert_eq!(
            addr.to_topic(),
            "0x0000000000000000000000006833df4e1edb361a04491349833c83a4868abcda"
        );
        assert_eq!(addr.to_topic().len(), 66);
    }

    #[test]
    fn test_address_same_as_ignores_case() {
        let a = Address::parse("0xDE1aFF6cc38f3dBed0A93b3C268Cf391B68209aF").unwrap();
        let b = Address::parse("0xde1aff6cc38f3dbed0a93b3c268cf391b68209af").unwrap();
        assert!(a.same_as(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_tx_hash_dedup_key() {
        let upper = TxHash::new("0xAA");
        let lower = TxHash::new("0xaa");
        assert_eq!(upper.dedup_key(), lower.dedup_key());
        assert_eq!(upper.as_str(), "0xAA");
    }

    #[test]
    fn test_tx_hash_serializes_as_string() {
        let json = serde_json::to_string(&TxHash::new("0xAA")).unwrap();
        assert_eq!(json, "\"0xAA\"");
    }
}
