//! Error types for port operations.

use blockhome_domain::Address;

/// Image capture failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    /// No renderer handle is registered for the requested strategy.
    #[error("No renderer handle is registered")]
    RendererUnavailable,

    /// The renderer produced an error while redrawing or reading back.
    #[error("Renderer readback failed: {0}")]
    Readback(String),

    /// The frame came back but looks empty (warm-up frame, black canvas).
    #[error("Frame looks blank ({0} bytes)")]
    BlankFrame(usize),

    /// Encoding the pixel buffer into the output format failed.
    #[error("Bitmap encoding failed: {0}")]
    Encode(String),

    /// Every applicable capture strategy failed.
    #[error("Capture unavailable: all strategies exhausted")]
    Exhausted,
}

/// Content store failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("Content store unreachable: {0}")]
    Unreachable(String),

    /// The store answered but without a content hash.
    #[error("Store response carried no content hash")]
    MissingHash,

    #[error("Content store request timed out")]
    Timeout,

    #[error("Document serialization failed: {0}")]
    Serialization(String),
}

/// Wallet provider failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    /// No compatible wallet provider is present.
    #[error("No wallet provider is available")]
    ProviderUnavailable,

    /// The user declined the connection prompt.
    #[error("Wallet connection was rejected by the user")]
    UserRejected,

    /// The provider reported zero authorized accounts.
    #[error("No authorized accounts")]
    NoAccounts,

    #[error("Provider error: {0}")]
    Rpc(String),
}

/// Token registry (contract) failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("Token {0} has not been minted")]
    NotMinted(u64),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// The configured mint policy rejects this caller.
    #[error("Minting not allowed for {0}")]
    NotAllowed(Address),

    #[error("Contract call failed: {0}")]
    Rpc(String),
}

/// Pet chat backend failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
