//! Development wallet provider.
//!
//! Stands in for the browser-injected provider: a fixed set of authorized
//! accounts with balances, a chain id, and a broadcast channel for
//! account/chain change notifications. The approval behavior is
//! configurable so the user-declined path can be exercised end to end.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use blockhome_domain::Address;

use crate::infrastructure::ports::{ProviderEvent, WalletError, WalletProviderPort};

/// What the simulated user does when the connection prompt appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalBehavior {
    Approve,
    Reject,
}

pub struct DevProvider {
    accounts: RwLock<Vec<Address>>,
    balances: RwLock<HashMap<Address, u128>>,
    chain_id: RwLock<u64>,
    behavior: ApprovalBehavior,
    events: broadcast::Sender<ProviderEvent>,
}

impl DevProvider {
    pub fn new(account: Address, balance_wei: u128, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        let mut balances = HashMap::new();
        balances.insert(account.clone(), balance_wei);
        Self {
            accounts: RwLock::new(vec![account]),
            balances: RwLock::new(balances),
            chain_id: RwLock::new(chain_id),
            behavior: ApprovalBehavior::Approve,
            events,
        }
    }

    pub fn with_behavior(mut self, behavior: ApprovalBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Swap the authorized account set and notify subscribers.
    pub async fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.write().await = accounts.clone();
        let _ = self.events.send(ProviderEvent::AccountsChanged(accounts));
    }

    /// Switch networks and notify subscribers.
    pub async fn set_chain_id(&self, chain_id: u64) {
        *self.chain_id.write().await = chain_id;
        let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
    }
}

#[async_trait]
impl WalletProviderPort for DevProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        match self.behavior {
            ApprovalBehavior::Reject => Err(WalletError::UserRejected),
            ApprovalBehavior::Approve => Ok(self.accounts.read().await.clone()),
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.accounts.read().await.clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(*self.chain_id.read().await)
    }

    async fn balance_of(&self, address: Address) -> Result<u128, WalletError> {
        Ok(self
            .balances
            .read()
            .await
            .get(&address)
            .copied()
            .unwrap_or(0))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n as u64)).expect("valid test address")
    }

    #[tokio::test]
    async fn test_approve_returns_accounts() {
        let provider = DevProvider::new(addr(1), 10_u128.pow(18), 31337);
        let accounts = provider.request_accounts().await.expect("accounts");
        assert_eq!(accounts, vec![addr(1)]);
        assert_eq!(provider.chain_id().await.expect("chain"), 31337);
    }

    #[tokio::test]
    async fn test_reject_behavior_surfaces_user_rejection() {
        let provider =
            DevProvider::new(addr(1), 0, 1).with_behavior(ApprovalBehavior::Reject);
        assert!(matches!(
            provider.request_accounts().await,
            Err(WalletError::UserRejected)
        ));
    }

    #[tokio::test]
    async fn test_unknown_account_has_zero_balance() {
        let provider = DevProvider::new(addr(1), 42, 1);
        assert_eq!(provider.balance_of(addr(9)).await.expect("balance"), 0);
    }

    #[tokio::test]
    async fn test_changes_are_broadcast() {
        let provider = DevProvider::new(addr(1), 0, 1);
        let mut rx = provider.subscribe();

        provider.set_accounts(vec![addr(2)]).await;
        match rx.recv().await.expect("event") {
            ProviderEvent::AccountsChanged(accounts) => assert_eq!(accounts, vec![addr(2)]),
            other => panic!("unexpected event: {other:?}"),
        }

        provider.set_chain_id(5).await;
        match rx.recv().await.expect("event") {
            ProviderEvent::ChainChanged(id) => assert_eq!(id, 5),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
