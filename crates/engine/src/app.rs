//! Application state and composition.

use std::sync::Arc;

use tokio::sync::watch;

use crate::infrastructure::capture::SceneCapturer;
use crate::infrastructure::clock::{SystemClock, SystemRandom};
use crate::infrastructure::ports::{
    ClockPort, LlmPort, PinStorePort, RandomPort, TokenRegistryPort, WalletProviderPort,
};
use crate::stores::GameStore;
use crate::use_cases::{ChatWithPet, GameActions, MintToken, WalletSession};

/// Main application state.
///
/// Holds the stores and use cases; passed to HTTP handlers via Axum state.
/// Rebuilt from scratch when the wallet provider switches networks.
pub struct App {
    pub game: GameActions,
    pub chat: ChatWithPet,
    pub mint: Arc<MintToken>,
    pub wallet: Arc<WalletSession>,
    pub capturer: Arc<SceneCapturer>,
    pub store: Arc<GameStore>,
    pub registry: Arc<dyn TokenRegistryPort>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// `reload` is bumped by the wallet session on a network change; the
    /// composition root watches it and rebuilds the App.
    pub fn new(
        pin_store: Arc<dyn PinStorePort>,
        registry: Arc<dyn TokenRegistryPort>,
        provider: Option<Arc<dyn WalletProviderPort>>,
        llm: Arc<dyn LlmPort>,
        reload: watch::Sender<u64>,
    ) -> Self {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());

        let store = Arc::new(GameStore::new());
        let capturer = Arc::new(SceneCapturer::new());
        let wallet = WalletSession::new(provider, reload);

        let mint = Arc::new(MintToken::new(
            wallet.clone(),
            pin_store,
            registry.clone(),
            capturer.clone(),
            store.clone(),
            random.clone(),
            clock,
        ));

        Self {
            game: GameActions::new(store.clone()),
            chat: ChatWithPet::new(llm, store.clone(), random),
            mint,
            wallet,
            capturer,
            store,
            registry,
        }
    }
}
