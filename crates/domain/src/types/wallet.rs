//! Wallet and chain vocabulary: account addresses and network names.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A checksummed-or-not EVM account address, stored lowercase.
///
/// Comparison is case-insensitive by construction: the address is normalized
/// to lowercase when created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = raw.as_ref().trim();
        let hex = raw
            .strip_prefix("0x")
            .ok_or_else(|| DomainError::parse(format!("Address must start with 0x: '{raw}'")))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::parse(format!(
                "Address must be 0x followed by 40 hex digits: '{raw}'"
            )));
        }
        Ok(Self(raw.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display: `0x1234…abcd`.
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::new(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// Human-readable name for a chain id.
pub fn network_name(chain_id: u64) -> String {
    match chain_id {
        1 => "Ethereum Mainnet".to_string(),
        5 => "Goerli Testnet".to_string(),
        11155111 => "Sepolia Testnet".to_string(),
        137 => "Polygon Mainnet".to_string(),
        80001 => "Mumbai Testnet".to_string(),
        44787 => "Celo Alfajores Testnet".to_string(),
        42220 => "Celo Mainnet".to_string(),
        other => format!("Unknown Network ({other})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1";

    #[test]
    fn test_address_normalizes_case() {
        let a = Address::new(ADDR).expect("valid address");
        let b = Address::new(ADDR.to_lowercase()).expect("valid address");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), ADDR.to_lowercase());
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(Address::new("90F8bf6A479f320ead074411a4B0e7944Ea8c9C1").is_err());
        assert!(Address::new("0x1234").is_err());
        assert!(Address::new("0xZZF8bf6A479f320ead074411a4B0e7944Ea8c9C1").is_err());
    }

    #[test]
    fn test_address_short_form() {
        let a = Address::new(ADDR).expect("valid address");
        assert_eq!(a.short(), "0x90f8…c9c1");
    }

    #[test]
    fn test_network_names() {
        assert_eq!(network_name(1), "Ethereum Mainnet");
        assert_eq!(network_name(11155111), "Sepolia Testnet");
        assert_eq!(network_name(31337), "Unknown Network (31337)");
    }
}
