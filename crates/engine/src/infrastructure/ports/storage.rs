//! Content store boundary: pin bytes, get back a content hash, resolve it
//! through mirror gateways.

use async_trait::async_trait;

use super::error::StorageError;

/// A content-addressed pinning service.
///
/// `pin_*` return the raw URI string the backend reported; callers validate
/// it against the canonical scheme themselves (a malformed identifier is a
/// caller-visible failure, not something to silently repair here).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PinStorePort: Send + Sync {
    /// Pin a binary blob; returns the canonical content URI string.
    async fn pin_blob(&self, bytes: Vec<u8>, filename: String) -> Result<String, StorageError>;

    /// Pin a JSON document; returns the canonical content URI string.
    async fn pin_json(
        &self,
        document: serde_json::Value,
        filename: String,
    ) -> Result<String, StorageError>;

    /// Best-effort reachability probe: true if any configured gateway
    /// serves the hash right now. Never fails; propagation delay across
    /// mirrors is expected.
    async fn check_file(&self, cid: String) -> bool;

    /// Mirror gateway URL prefixes, in preference order. Never empty.
    fn gateways(&self) -> Vec<String>;
}
