//! Chain-side boundaries: the injected wallet provider and the bound token
//! registry contract.

use async_trait::async_trait;
use blockhome_domain::Address;
use tokio::sync::broadcast;

use super::error::{RegistryError, WalletError};

/// Notifications the wallet provider pushes at the application.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// The set of authorized accounts changed; empty means the user revoked
    /// access entirely.
    AccountsChanged(Vec<Address>),
    /// The active network changed. Contract bindings are network-specific,
    /// so the application context must be rebuilt.
    ChainChanged(u64),
}

/// The injected wallet provider: authorized accounts, chain, balances, and
/// change notifications. Signing stays inside the provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletProviderPort: Send + Sync {
    /// Prompt the user to authorize accounts. Fails with `UserRejected`
    /// when the user declines.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Currently authorized accounts, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// Account balance in wei.
    async fn balance_of(&self, address: Address) -> Result<u128, WalletError>;

    /// Subscribe to account/chain change notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// The `CharacterMinted(tokenId, owner, uri)` event, emitted exactly once
/// per successful mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintEvent {
    pub token_id: u64,
    pub owner: Address,
    pub uri: String,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub status: bool,
    pub gas_used: u64,
    pub events: Vec<MintEvent>,
}

/// The bound token contract handle.
///
/// Mirrors the contract ABI: `mintCharacter(address,string) -> uint256`,
/// `tokenURI(uint256)`, `ownerOf(uint256)`, `getTotalTokens()`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRegistryPort: Send + Sync {
    async fn estimate_mint_gas(&self, to: Address, uri: String) -> Result<u64, RegistryError>;

    /// Submit the mint transaction and wait for the receipt. `from` is the
    /// signing account; `to` receives the token.
    async fn mint_character(
        &self,
        from: Address,
        to: Address,
        uri: String,
        gas_limit: u64,
    ) -> Result<TxReceipt, RegistryError>;

    /// Fails with `NotMinted` for ids that were never assigned.
    async fn token_uri(&self, token_id: u64) -> Result<String, RegistryError>;

    /// Fails with `NotMinted` for ids that were never assigned.
    async fn owner_of(&self, token_id: u64) -> Result<Address, RegistryError>;

    /// Count of successful mints to date; monotonically non-decreasing.
    async fn total_tokens(&self) -> Result<u64, RegistryError>;
}
