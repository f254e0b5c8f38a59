//! The mint orchestrator.
//!
//! Drives the end-to-end sequence: wallet connection, bitmap capture (or
//! preview reuse), image upload, metadata composition and upload, the
//! on-chain mint call, and token-id extraction from the emitted event.
//! Steps run strictly sequentially; each is a hard precondition for the
//! next. The orchestrator is single-flight: a second invocation while one
//! is running is rejected with `MintInFlight`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use blockhome_domain::{
    AvatarConfig, ContentUri, DomainError, MintResult, MintStage, Progression, TokenMetadata,
    TraitEntry,
};

use crate::infrastructure::capture::SceneCapturer;
use crate::infrastructure::ports::{
    ClockPort, PinStorePort, RandomPort, StorageError, TokenRegistryPort, WalletError,
};
use crate::stores::GameStore;
use crate::use_cases::wallet::WalletSession;

use super::error::MintError;

/// Above this size wallets start refusing to render the image; warn but
/// keep going.
const MAX_IMAGE_BYTES: usize = 500 * 1024;

/// Extra gas on top of the estimate.
const GAS_HEADROOM: u64 = 50_000;

/// How long after a successful mint the diagnostic gateway probe waits.
const POST_MINT_VERIFICATION_DELAY: Duration = Duration::from_secs(5);

/// How one mint invocation ended.
#[derive(Debug, Clone)]
pub enum MintOutcome {
    Completed(MintResult),
    /// The user declined the wallet prompt; the attempt is abandoned with
    /// no recorded result.
    AbortedByUser,
}

/// Status + last result, as served to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct MintStatusView {
    pub stage: MintStage,
    pub result: Option<MintResult>,
}

pub struct MintToken {
    wallet: Arc<WalletSession>,
    store: Arc<dyn PinStorePort>,
    registry: Arc<dyn TokenRegistryPort>,
    capturer: Arc<SceneCapturer>,
    game: Arc<GameStore>,
    random: Arc<dyn RandomPort>,
    clock: Arc<dyn ClockPort>,
    stage: RwLock<MintStage>,
    result: RwLock<Option<MintResult>>,
    flight: Mutex<()>,
    verification_delay: Duration,
}

impl MintToken {
    pub fn new(
        wallet: Arc<WalletSession>,
        store: Arc<dyn PinStorePort>,
        registry: Arc<dyn TokenRegistryPort>,
        capturer: Arc<SceneCapturer>,
        game: Arc<GameStore>,
        random: Arc<dyn RandomPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            wallet,
            store,
            registry,
            capturer,
            game,
            random,
            clock,
            stage: RwLock::new(MintStage::Idle),
            result: RwLock::new(None),
            flight: Mutex::new(()),
            verification_delay: POST_MINT_VERIFICATION_DELAY,
        }
    }

    /// Shorter deferred-verification delay (for tests).
    pub fn with_verification_delay(mut self, delay: Duration) -> Self {
        self.verification_delay = delay;
        self
    }

    pub async fn status(&self) -> MintStatusView {
        MintStatusView {
            stage: *self.stage.read().await,
            result: self.result.read().await.clone(),
        }
    }

    /// Manual return to `Idle` from a terminal stage. Clears the last
    /// result and the captured preview.
    pub async fn reset(&self) -> Result<(), DomainError> {
        let mut stage = self.stage.write().await;
        let next = stage.reset()?;
        *stage = next;
        drop(stage);
        *self.result.write().await = None;
        self.game.clear_preview().await;
        Ok(())
    }

    /// Run one mint attempt.
    pub async fn execute(&self) -> Result<MintOutcome, MintError> {
        let _flight = self
            .flight
            .try_lock()
            .map_err(|_| MintError::MintInFlight)?;

        // 1. Wallet. A user decline abandons the attempt silently.
        let account = match self.wallet.ensure_connected().await {
            Ok(account) => account,
            Err(WalletError::UserRejected) => {
                tracing::info!("Mint aborted: user declined the wallet prompt");
                self.set_stage(MintStage::Idle).await;
                return Ok(MintOutcome::AbortedByUser);
            }
            Err(e) => return self.fail(e.into()).await,
        };

        // 2. Bitmap: reuse the captured preview when one exists.
        self.set_stage(MintStage::Capturing).await;
        let avatar = self.game.avatar().await;
        let bitmap = match self.game.preview().await {
            Some(preview) => {
                tracing::debug!("Reusing the captured preview");
                preview
            }
            None => match self.capturer.capture(&avatar).await {
                Ok(bitmap) => bitmap,
                Err(e) => return self.fail(e.into()).await,
            },
        };
        if bitmap.len() > MAX_IMAGE_BYTES {
            tracing::warn!(
                bytes = bitmap.len(),
                "Image exceeds {}KB, wallets may not display it",
                MAX_IMAGE_BYTES / 1024
            );
        }

        // 3. Pin the image and validate the returned identifier.
        self.set_stage(MintStage::Uploading).await;
        let filename = format!("BlockCharacter_{}.png", self.clock.now_millis());
        let raw_image_uri = match self.store.pin_blob(bitmap.bytes.clone(), filename).await {
            Ok(uri) => uri,
            Err(e) => return self.fail(e.into()).await,
        };
        let image_uri = match ContentUri::parse(&raw_image_uri) {
            Ok(uri) => uri,
            Err(_) => {
                return self
                    .fail(MintError::MalformedContentUri(raw_image_uri))
                    .await
            }
        };

        // 4. Compose metadata around the HTTP-resolved image URL.
        let gateway = self
            .store
            .gateways()
            .into_iter()
            .next()
            .unwrap_or_else(|| "https://ipfs.io/ipfs/".to_string());
        let image_http_url = image_uri.resolve(&gateway);
        let progression = self.game.progression().await;
        let name = format!("Block Character #{}", self.random.gen_range(0, 9999));
        let metadata = compose_metadata(&name, &avatar, &progression, &image_http_url);

        // 5. Pin the metadata document; same scheme validation.
        let document = match serde_json::to_value(&metadata) {
            Ok(value) => value,
            Err(e) => {
                return self
                    .fail(StorageError::Serialization(e.to_string()).into())
                    .await
            }
        };
        let raw_metadata_uri = match self
            .store
            .pin_json(document, "metadata.json".to_string())
            .await
        {
            Ok(uri) => uri,
            Err(e) => return self.fail(e.into()).await,
        };
        let metadata_uri = match ContentUri::parse(&raw_metadata_uri) {
            Ok(uri) => uri,
            Err(_) => {
                return self
                    .fail(MintError::MalformedContentUri(raw_metadata_uri))
                    .await
            }
        };

        // 6. On-chain mint through the bound contract handle.
        self.set_stage(MintStage::Minting).await;
        let gas = match self
            .registry
            .estimate_mint_gas(account.clone(), metadata_uri.to_string())
            .await
        {
            Ok(gas) => gas,
            Err(e) => return self.fail(MintError::MintFailed(e.to_string())).await,
        };
        let receipt = match self
            .registry
            .mint_character(
                account.clone(),
                account.clone(),
                metadata_uri.to_string(),
                gas + GAS_HEADROOM,
            )
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => return self.fail(MintError::MintFailed(e.to_string())).await,
        };
        if !receipt.status {
            return self
                .fail(MintError::MintFailed("transaction reverted".to_string()))
                .await;
        }

        // 7. The token id comes from the emitted mint event. A successful
        // receipt without the event is still a failure; query the total so
        // an operator can reconcile a token that may exist on-chain.
        let Some(event) = receipt.events.first() else {
            let total = self.registry.total_tokens().await.ok();
            tracing::error!(
                total_tokens = ?total,
                "Transaction succeeded but the receipt carried no mint event"
            );
            return self
                .fail(MintError::MintFailed(
                    "mint event missing from receipt".to_string(),
                ))
                .await;
        };
        let token_id = event.token_id;

        // Read-back check, log only.
        match self.registry.token_uri(token_id).await {
            Ok(stored) if stored != metadata_uri.to_string() => {
                tracing::warn!(
                    token_id,
                    stored = %stored,
                    expected = %metadata_uri,
                    "Stored token URI differs from the submitted one"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(token_id, error = %e, "Token URI read-back failed"),
        }

        let result = MintResult::Success {
            token_id,
            metadata_uri: metadata_uri.clone(),
            image_uri: image_uri.clone(),
        };
        self.set_stage(MintStage::Success).await;
        *self.result.write().await = Some(result.clone());
        tracing::info!(token_id, metadata_uri = %metadata_uri, "Mint succeeded");

        // 8. Deferred diagnostic probe; never affects the recorded result.
        self.spawn_post_mint_verification(image_uri.cid().to_string());

        Ok(MintOutcome::Completed(result))
    }

    async fn set_stage(&self, stage: MintStage) {
        *self.stage.write().await = stage;
    }

    async fn fail(&self, error: MintError) -> Result<MintOutcome, MintError> {
        tracing::error!(error = %error, "Mint attempt failed");
        self.set_stage(MintStage::Error).await;
        *self.result.write().await = Some(MintResult::failure(error.to_string()));
        Err(error)
    }

    fn spawn_post_mint_verification(&self, cid: String) {
        let store = self.store.clone();
        let delay = self.verification_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if store.check_file(cid.clone()).await {
                tracing::info!(cid = %cid, "Minted image resolves through the gateway chain");
            } else {
                tracing::warn!(
                    cid = %cid,
                    "Minted image not yet resolvable, propagation may lag"
                );
            }
        });
    }
}

/// One attribute per configured avatar trait, plus the progression traits.
fn compose_metadata(
    name: &str,
    avatar: &AvatarConfig,
    progression: &Progression,
    image_http_url: &str,
) -> TokenMetadata {
    let mut attributes = avatar.trait_entries();
    attributes.push(TraitEntry::number("Level", progression.level as u64));
    attributes.push(TraitEntry::number(
        "Decorations",
        progression.placed.len() as u64,
    ));
    TokenMetadata::new(name, avatar.describe(name), image_http_url, attributes)
}
