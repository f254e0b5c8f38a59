//! Wallet session: connection state machine over the injected provider.
//!
//! `Disconnected -> Connecting -> Connected`, with `Connected ->
//! Disconnected` on explicit disconnect or when the provider reports zero
//! authorized accounts. While connected the session watches provider
//! notifications: account changes re-resolve the binding, a network change
//! fires the application reload signal - contract bindings are
//! network-specific and are never hot-swapped.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch, RwLock};

use blockhome_domain::{network_name, Address};

use crate::infrastructure::ports::{ProviderEvent, WalletError, WalletProviderPort};

const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone)]
struct ConnectedState {
    account: Address,
    balance_wei: u128,
    chain_id: u64,
}

#[derive(Debug, Clone)]
enum SessionState {
    Disconnected,
    Connecting,
    Connected(ConnectedState),
}

/// Wallet view served to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct WalletSnapshot {
    pub status: WalletStatus,
    pub account: Option<Address>,
    pub balance_eth: Option<String>,
    pub network: Option<String>,
    pub chain_id: Option<u64>,
}

pub struct WalletSession {
    provider: Option<Arc<dyn WalletProviderPort>>,
    state: RwLock<SessionState>,
    reload: watch::Sender<u64>,
}

impl WalletSession {
    /// Build the session and start watching provider notifications.
    ///
    /// `reload` is the application-context reload signal: bumped whenever
    /// the provider switches networks.
    pub fn new(
        provider: Option<Arc<dyn WalletProviderPort>>,
        reload: watch::Sender<u64>,
    ) -> Arc<Self> {
        let session = Arc::new(Self {
            provider: provider.clone(),
            state: RwLock::new(SessionState::Disconnected),
            reload,
        });

        if let Some(provider) = provider {
            let weak = Arc::downgrade(&session);
            let mut events = provider.subscribe();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => {
                            let Some(session) = weak.upgrade() else { break };
                            session.handle_event(event).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Wallet event stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }

        session
    }

    /// Connect to the wallet. Fails with `ProviderUnavailable` when no
    /// provider is injected and `UserRejected` when the user declines.
    pub async fn connect(&self) -> Result<Address, WalletError> {
        let provider = self
            .provider
            .clone()
            .ok_or(WalletError::ProviderUnavailable)?;

        *self.state.write().await = SessionState::Connecting;

        match self.resolve_connection(provider.as_ref()).await {
            Ok(account) => Ok(account),
            Err(e) => {
                *self.state.write().await = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    async fn resolve_connection(
        &self,
        provider: &dyn WalletProviderPort,
    ) -> Result<Address, WalletError> {
        let accounts = provider.request_accounts().await?;
        let account = accounts.first().cloned().ok_or(WalletError::NoAccounts)?;

        let balance_wei = provider.balance_of(account.clone()).await?;
        let chain_id = provider.chain_id().await?;

        tracing::info!(
            account = %account.short(),
            network = %network_name(chain_id),
            "Wallet connected"
        );

        *self.state.write().await = SessionState::Connected(ConnectedState {
            account: account.clone(),
            balance_wei,
            chain_id,
        });
        Ok(account)
    }

    /// Return the connected account, connecting first if needed.
    pub async fn ensure_connected(&self) -> Result<Address, WalletError> {
        if let Some(account) = self.account().await {
            return Ok(account);
        }
        self.connect().await
    }

    /// Local state reset only - does not revoke any provider authorization.
    pub async fn disconnect(&self) {
        *self.state.write().await = SessionState::Disconnected;
        tracing::info!("Wallet disconnected");
    }

    pub async fn account(&self) -> Option<Address> {
        match &*self.state.read().await {
            SessionState::Connected(c) => Some(c.account.clone()),
            _ => None,
        }
    }

    pub async fn snapshot(&self) -> WalletSnapshot {
        match &*self.state.read().await {
            SessionState::Disconnected => WalletSnapshot {
                status: WalletStatus::Disconnected,
                account: None,
                balance_eth: None,
                network: None,
                chain_id: None,
            },
            SessionState::Connecting => WalletSnapshot {
                status: WalletStatus::Connecting,
                account: None,
                balance_eth: None,
                network: None,
                chain_id: None,
            },
            SessionState::Connected(c) => WalletSnapshot {
                status: WalletStatus::Connected,
                account: Some(c.account.clone()),
                balance_eth: Some(format_eth(c.balance_wei)),
                network: Some(network_name(c.chain_id)),
                chain_id: Some(c.chain_id),
            },
        }
    }

    async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                tracing::info!("Provider reports zero authorized accounts");
                self.disconnect().await;
            }
            ProviderEvent::AccountsChanged(accounts) => {
                let Some(account) = accounts.first().cloned() else {
                    return;
                };
                let connected = matches!(&*self.state.read().await, SessionState::Connected(_));
                if !connected {
                    return;
                }
                let Some(provider) = self.provider.clone() else {
                    return;
                };
                // Re-resolve balance and binding for the new active account.
                let balance_wei = provider.balance_of(account.clone()).await.unwrap_or(0);
                let chain_id = match provider.chain_id().await {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::warn!(error = %e, "Account change re-sync failed");
                        self.disconnect().await;
                        return;
                    }
                };
                tracing::info!(account = %account.short(), "Active account changed");
                *self.state.write().await = SessionState::Connected(ConnectedState {
                    account,
                    balance_wei,
                    chain_id,
                });
            }
            ProviderEvent::ChainChanged(chain_id) => {
                tracing::warn!(
                    network = %network_name(chain_id),
                    "Network changed, reloading application context"
                );
                *self.state.write().await = SessionState::Disconnected;
                self.reload.send_modify(|generation| *generation += 1);
            }
        }
    }
}

/// Wei to a four-decimal ETH display string.
fn format_eth(wei: u128) -> String {
    let whole = wei / WEI_PER_ETH;
    let frac = (wei % WEI_PER_ETH) / (WEI_PER_ETH / 10_000);
    format!("{whole}.{frac:04}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockWalletProviderPort;
    use crate::infrastructure::provider::{ApprovalBehavior, DevProvider};
    use std::time::Duration;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n as u64)).expect("valid test address")
    }

    fn reload_channel() -> (watch::Sender<u64>, watch::Receiver<u64>) {
        watch::channel(0)
    }

    async fn wait_until<F, Fut>(mut condition: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..200 {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_connect_resolves_account_balance_and_network() {
        let provider = Arc::new(DevProvider::new(addr(1), 2 * WEI_PER_ETH / 4, 11155111));
        let (tx, _rx) = reload_channel();
        let session = WalletSession::new(Some(provider), tx);

        let account = session.connect().await.expect("connect");
        assert_eq!(account, addr(1));

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.status, WalletStatus::Connected);
        assert_eq!(snapshot.balance_eth.as_deref(), Some("0.5000"));
        assert_eq!(snapshot.network.as_deref(), Some("Sepolia Testnet"));
    }

    #[tokio::test]
    async fn test_connect_without_provider_fails() {
        let (tx, _rx) = reload_channel();
        let session = WalletSession::new(None, tx);
        assert!(matches!(
            session.connect().await,
            Err(WalletError::ProviderUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_user_rejection_returns_to_disconnected() {
        let provider = Arc::new(
            DevProvider::new(addr(1), 0, 1).with_behavior(ApprovalBehavior::Reject),
        );
        let (tx, _rx) = reload_channel();
        let session = WalletSession::new(Some(provider), tx);

        assert!(matches!(
            session.connect().await,
            Err(WalletError::UserRejected)
        ));
        assert_eq!(session.snapshot().await.status, WalletStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_empty_account_list_is_no_accounts() {
        let mut provider = MockWalletProviderPort::new();
        provider.expect_request_accounts().returning(|| Ok(Vec::new()));
        let (events, _) = broadcast::channel::<ProviderEvent>(4);
        provider
            .expect_subscribe()
            .returning(move || events.subscribe());

        let (tx, _rx) = reload_channel();
        let session = WalletSession::new(Some(Arc::new(provider)), tx);
        assert!(matches!(
            session.connect().await,
            Err(WalletError::NoAccounts)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_is_local_reset() {
        let provider = Arc::new(DevProvider::new(addr(1), 0, 1));
        let (tx, _rx) = reload_channel();
        let session = WalletSession::new(Some(provider.clone()), tx);
        session.connect().await.expect("connect");

        session.disconnect().await;
        assert_eq!(session.snapshot().await.status, WalletStatus::Disconnected);
        // The provider still considers the account authorized.
        assert_eq!(provider.accounts().await.expect("accounts"), vec![addr(1)]);
    }

    #[tokio::test]
    async fn test_zero_accounts_event_disconnects() {
        let provider = Arc::new(DevProvider::new(addr(1), 0, 1));
        let (tx, _rx) = reload_channel();
        let session = WalletSession::new(Some(provider.clone()), tx);
        session.connect().await.expect("connect");

        provider.set_accounts(Vec::new()).await;
        wait_until(|| async {
            session.snapshot().await.status == WalletStatus::Disconnected
        })
        .await;
    }

    #[tokio::test]
    async fn test_account_change_rebinds_active_account() {
        let provider = Arc::new(DevProvider::new(addr(1), 0, 1));
        let (tx, _rx) = reload_channel();
        let session = WalletSession::new(Some(provider.clone()), tx);
        session.connect().await.expect("connect");

        provider.set_accounts(vec![addr(7)]).await;
        wait_until(|| async { session.account().await == Some(addr(7)) }).await;
    }

    #[tokio::test]
    async fn test_chain_change_fires_reload_signal() {
        let provider = Arc::new(DevProvider::new(addr(1), 0, 1));
        let (tx, mut rx) = reload_channel();
        let session = WalletSession::new(Some(provider.clone()), tx);
        session.connect().await.expect("connect");

        provider.set_chain_id(137).await;
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("reload signal in time")
            .expect("sender alive");
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(session.snapshot().await.status, WalletStatus::Disconnected);
    }

    #[test]
    fn test_format_eth() {
        assert_eq!(format_eth(0), "0.0000");
        assert_eq!(format_eth(WEI_PER_ETH), "1.0000");
        assert_eq!(format_eth(WEI_PER_ETH / 2), "0.5000");
        assert_eq!(format_eth(1_234_500_000_000_000_000), "1.2345");
    }
}
