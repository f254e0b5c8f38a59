//! In-process token registry implementing the contract semantics.
//!
//! Mirrors the on-chain contract: sequential token ids starting at 1, an
//! append-only `(owner, uri)` record per id, a `CharacterMinted` event
//! emitted exactly once per successful mint, and lookups that fail for ids
//! never assigned. Records are immutable once written - there is no
//! reassignment and no burn.

use async_trait::async_trait;
use tokio::sync::RwLock;

use blockhome_domain::Address;

use crate::infrastructure::ports::{
    MintEvent, RegistryError, TokenRegistryPort, TxReceipt,
};

/// Who may mint. The upstream contract left mint unrestricted; that is kept
/// as the default, but the policy is explicit so a deployment can restrict
/// mint to the operator account instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintPolicy {
    /// Anyone may mint, targeting any recipient.
    Open,
    /// Only the named operator account may mint.
    OperatorOnly(Address),
}

#[derive(Debug, Clone)]
struct TokenRecord {
    owner: Address,
    uri: String,
}

/// In-memory registry; the dev/test stand-in for the deployed contract.
pub struct InMemoryRegistry {
    records: RwLock<Vec<TokenRecord>>,
    policy: MintPolicy,
}

/// Flat per-mint gas cost plus a per-byte charge for the stored URI.
const MINT_BASE_GAS: u64 = 120_000;
const GAS_PER_URI_BYTE: u64 = 16;

impl InMemoryRegistry {
    pub fn new(policy: MintPolicy) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            policy,
        }
    }

    fn gas_for(uri: &str) -> u64 {
        MINT_BASE_GAS + uri.len() as u64 * GAS_PER_URI_BYTE
    }
}

#[async_trait]
impl TokenRegistryPort for InMemoryRegistry {
    async fn estimate_mint_gas(&self, _to: Address, uri: String) -> Result<u64, RegistryError> {
        Ok(Self::gas_for(&uri))
    }

    async fn mint_character(
        &self,
        from: Address,
        to: Address,
        uri: String,
        gas_limit: u64,
    ) -> Result<TxReceipt, RegistryError> {
        if let MintPolicy::OperatorOnly(operator) = &self.policy {
            if &from != operator {
                return Err(RegistryError::NotAllowed(from));
            }
        }

        let gas_used = Self::gas_for(&uri);
        if gas_limit < gas_used {
            return Err(RegistryError::Reverted(format!(
                "out of gas: limit {gas_limit}, needed {gas_used}"
            )));
        }

        let mut records = self.records.write().await;
        records.push(TokenRecord {
            owner: to.clone(),
            uri: uri.clone(),
        });
        let token_id = records.len() as u64;

        tracing::info!(token_id, owner = %to, uri = %uri, "CharacterMinted");

        Ok(TxReceipt {
            status: true,
            gas_used,
            events: vec![MintEvent {
                token_id,
                owner: to,
                uri,
            }],
        })
    }

    async fn token_uri(&self, token_id: u64) -> Result<String, RegistryError> {
        let records = self.records.read().await;
        token_id
            .checked_sub(1)
            .and_then(|i| records.get(i as usize))
            .map(|r| r.uri.clone())
            .ok_or(RegistryError::NotMinted(token_id))
    }

    async fn owner_of(&self, token_id: u64) -> Result<Address, RegistryError> {
        let records = self.records.read().await;
        token_id
            .checked_sub(1)
            .and_then(|i| records.get(i as usize))
            .map(|r| r.owner.clone())
            .ok_or(RegistryError::NotMinted(token_id))
    }

    async fn total_tokens(&self) -> Result<u64, RegistryError> {
        Ok(self.records.read().await.len() as u64)
    }
}
