//! Mint pipeline error taxonomy.
//!
//! Every recovery is either a same-call fallback (capture strategies,
//! storage backend) or requires the user to re-invoke mint manually; no
//! step is retried automatically.

use crate::infrastructure::ports::{CaptureError, StorageError, WalletError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum MintError {
    /// A second mint was invoked while one is in flight. The attempt is
    /// rejected, not queued.
    #[error("A mint attempt is already in flight")]
    MintInFlight,

    #[error("Image capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Content store upload failed: {0}")]
    Storage(#[from] StorageError),

    /// The store returned an identifier outside the canonical scheme.
    /// Fatal, no retry.
    #[error("Content store returned a malformed URI: {0}")]
    MalformedContentUri(String),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// The on-chain call reverted, ran out of gas, or succeeded without
    /// the expected mint event.
    #[error("Mint transaction failed: {0}")]
    MintFailed(String),
}
