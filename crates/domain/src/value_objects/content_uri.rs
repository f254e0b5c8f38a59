//! Content-addressed URI value object.
//!
//! The canonical form is `ipfs://<cid>`. The scheme is resolution-service
//! agnostic: substituting any mirror gateway prefix for the scheme yields a
//! fetchable HTTP URL. Parsing also accepts a bare CID or any gateway URL
//! containing an `/ipfs/<cid>` path segment, so identifiers coming back
//! from different store frontends normalize to the same value.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical content URI scheme prefix.
pub const IPFS_SCHEME: &str = "ipfs://";

/// A validated `ipfs://<cid>` content URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentUri {
    cid: String,
}

impl ContentUri {
    /// Parse from the canonical scheme, a gateway URL, or a bare CID.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        let cid = if let Some(rest) = raw.strip_prefix(IPFS_SCHEME) {
            rest
        } else if let Some((_, rest)) = raw.split_once("/ipfs/") {
            rest
        } else if !raw.contains("://") && !raw.contains('/') {
            raw
        } else {
            return Err(DomainError::parse(format!(
                "Not a content URI (expected {IPFS_SCHEME}<cid>): '{raw}'"
            )));
        };

        if cid.is_empty() || !cid.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::parse(format!(
                "Content hash must be non-empty and alphanumeric: '{raw}'"
            )));
        }

        Ok(Self {
            cid: cid.to_string(),
        })
    }

    /// The bare content hash.
    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// Substitute a gateway prefix for the scheme, producing a fetchable URL.
    pub fn resolve(&self, gateway_prefix: &str) -> String {
        format!("{gateway_prefix}{}", self.cid)
    }
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{IPFS_SCHEME}{}", self.cid)
    }
}

impl FromStr for ContentUri {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentUri {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentUri> for String {
    fn from(value: ContentUri) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_scheme() {
        let uri = ContentUri::parse("ipfs://QmTestHash123").expect("valid uri");
        assert_eq!(uri.cid(), "QmTestHash123");
        assert_eq!(uri.to_string(), "ipfs://QmTestHash123");
    }

    #[test]
    fn test_parse_gateway_url() {
        let uri =
            ContentUri::parse("https://gateway.pinata.cloud/ipfs/QmAbc").expect("valid uri");
        assert_eq!(uri.cid(), "QmAbc");
    }

    #[test]
    fn test_parse_bare_cid() {
        let uri = ContentUri::parse("QmAbc").expect("valid uri");
        assert_eq!(uri.to_string(), "ipfs://QmAbc");
    }

    #[test]
    fn test_rejects_other_schemes_and_junk() {
        assert!(ContentUri::parse("https://example.com/file.png").is_err());
        assert!(ContentUri::parse("ipfs://").is_err());
        assert!(ContentUri::parse("ipfs://has/slash").is_err());
        assert!(ContentUri::parse("").is_err());
    }

    #[test]
    fn test_gateway_resolution_roundtrip() {
        let uri = ContentUri::parse("ipfs://QmRoundTrip").expect("valid uri");
        let url = uri.resolve("https://ipfs.io/ipfs/");
        assert_eq!(url, "https://ipfs.io/ipfs/QmRoundTrip");
        // Resolving and re-parsing yields the same identifier.
        assert_eq!(ContentUri::parse(&url).expect("reparse"), uri);
    }
}
