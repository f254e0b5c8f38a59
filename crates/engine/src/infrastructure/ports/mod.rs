//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Ports exist for the
//! external collaborators the system treats as black boxes:
//! - the scene renderer (could be WebGL, a plugin runtime, a DOM subtree)
//! - the content store (could swap pinning backends)
//! - the wallet provider and bound token contract
//! - the pet chat LLM
//! - clock/random (for testing)

pub mod chain;
pub mod error;
pub mod llm;
pub mod renderer;
pub mod storage;
pub mod testing;

pub use chain::{MintEvent, ProviderEvent, TokenRegistryPort, TxReceipt, WalletProviderPort};
pub use error::{CaptureError, LlmError, RegistryError, StorageError, WalletError};
pub use llm::{ChatMessage, LlmPort, LlmRequest, LlmResponse, MessageRole};
pub use renderer::{Bitmap, RawFrame, RendererPort};
pub use storage::PinStorePort;
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use chain::{MockTokenRegistryPort, MockWalletProviderPort};
#[cfg(test)]
pub use llm::MockLlmPort;
#[cfg(test)]
pub use renderer::MockRendererPort;
#[cfg(test)]
pub use storage::MockPinStorePort;
