//! HTTP routes.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use blockhome_domain::{
    AvatarConfig, DecorationId, DomainError, FoodKind, PlacedDecoration, ShopError,
};

use crate::app::App;
use crate::infrastructure::ports::{RegistryError, WalletError};
use crate::use_cases::chat::ChatTurn;
use crate::use_cases::game::{ActionReport, GameSnapshot};
use crate::use_cases::mint::{MintError, MintOutcome, MintStatusView};
use crate::use_cases::wallet::WalletSnapshot;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/game", get(get_game))
        .route("/api/game/avatar", put(update_avatar))
        .route("/api/game/pet", post(pet))
        .route("/api/game/feed", post(feed))
        .route("/api/game/shop/buy", post(buy_decoration))
        .route("/api/game/decorations", post(place_decoration))
        .route("/api/game/decorations/{id}", delete(remove_decoration))
        .route("/api/chat", post(chat))
        .route("/api/wallet", get(wallet_status))
        .route("/api/wallet/connect", post(wallet_connect))
        .route("/api/wallet/disconnect", post(wallet_disconnect))
        .route("/api/capture", post(capture_preview))
        .route("/api/mint", get(mint_status).post(run_mint))
        .route("/api/mint/reset", post(mint_reset))
        .route("/api/tokens", get(total_tokens))
        .route("/api/tokens/{id}", get(get_token))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Game
// =============================================================================

async fn get_game(State(app): State<Arc<App>>) -> Json<GameSnapshot> {
    Json(app.game.snapshot().await)
}

async fn update_avatar(
    State(app): State<Arc<App>>,
    Json(config): Json<AvatarConfig>,
) -> Json<GameSnapshot> {
    Json(app.game.customize(config).await)
}

async fn pet(State(app): State<Arc<App>>) -> Json<ActionReport> {
    Json(app.game.pet().await)
}

#[derive(Deserialize)]
struct FeedRequest {
    food: FoodKind,
}

async fn feed(
    State(app): State<Arc<App>>,
    Json(request): Json<FeedRequest>,
) -> Json<ActionReport> {
    Json(app.game.feed(request.food).await)
}

#[derive(Deserialize)]
struct BuyRequest {
    name: String,
    price: u32,
}

async fn buy_decoration(
    State(app): State<Arc<App>>,
    Json(request): Json<BuyRequest>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let snapshot = app
        .game
        .buy_decoration(&request.name, request.price)
        .await?;
    Ok(Json(snapshot))
}

#[derive(Deserialize)]
struct PlaceRequest {
    kind: String,
    x: f32,
    y: f32,
}

async fn place_decoration(
    State(app): State<Arc<App>>,
    Json(request): Json<PlaceRequest>,
) -> Result<Json<PlacedDecoration>, ApiError> {
    let placed = app
        .game
        .place_decoration(request.kind, request.x, request.y)
        .await?;
    Ok(Json(placed))
}

async fn remove_decoration(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<(), ApiError> {
    if app
        .game
        .remove_decoration(DecorationId::from_uuid(id))
        .await
    {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}

// =============================================================================
// Chat
// =============================================================================

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatTurn>,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

async fn chat(
    State(app): State<Arc<App>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let reply = app.chat.execute(request.message, request.history).await;
    Json(ChatResponse { reply })
}

// =============================================================================
// Wallet
// =============================================================================

async fn wallet_status(State(app): State<Arc<App>>) -> Json<WalletSnapshot> {
    Json(app.wallet.snapshot().await)
}

async fn wallet_connect(
    State(app): State<Arc<App>>,
) -> Result<Json<WalletSnapshot>, ApiError> {
    app.wallet.connect().await?;
    Ok(Json(app.wallet.snapshot().await))
}

async fn wallet_disconnect(State(app): State<Arc<App>>) -> Json<WalletSnapshot> {
    app.wallet.disconnect().await;
    Json(app.wallet.snapshot().await)
}

// =============================================================================
// Capture & mint
// =============================================================================

#[derive(Serialize)]
struct CaptureResponse {
    width: u32,
    height: u32,
    bytes: usize,
}

async fn capture_preview(
    State(app): State<Arc<App>>,
) -> Result<Json<CaptureResponse>, ApiError> {
    let avatar = app.store.avatar().await;
    let bitmap = app
        .capturer
        .capture(&avatar)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let response = CaptureResponse {
        width: bitmap.width,
        height: bitmap.height,
        bytes: bitmap.len(),
    };
    app.store.set_preview(bitmap).await;
    Ok(Json(response))
}

async fn mint_status(State(app): State<Arc<App>>) -> Json<MintStatusView> {
    Json(app.mint.status().await)
}

#[derive(Serialize)]
struct MintRunResponse {
    aborted: bool,
    #[serde(flatten)]
    status: MintStatusView,
}

/// Run one mint attempt. Pipeline failures are part of the status machine
/// and come back as a 200 with the `error` stage recorded; only a
/// concurrent attempt is rejected outright.
async fn run_mint(State(app): State<Arc<App>>) -> Result<Json<MintRunResponse>, ApiError> {
    let aborted = match app.mint.execute().await {
        Ok(MintOutcome::Completed(_)) => false,
        Ok(MintOutcome::AbortedByUser) => true,
        Err(MintError::MintInFlight) => {
            return Err(ApiError::Conflict(MintError::MintInFlight.to_string()))
        }
        Err(_) => false,
    };
    Ok(Json(MintRunResponse {
        aborted,
        status: app.mint.status().await,
    }))
}

async fn mint_reset(State(app): State<Arc<App>>) -> Result<Json<MintStatusView>, ApiError> {
    app.mint.reset().await?;
    Ok(Json(app.mint.status().await))
}

// =============================================================================
// Tokens
// =============================================================================

#[derive(Serialize)]
struct TokenResponse {
    token_id: u64,
    owner: String,
    uri: String,
}

async fn get_token(
    State(app): State<Arc<App>>,
    Path(id): Path<u64>,
) -> Result<Json<TokenResponse>, ApiError> {
    let owner = app.registry.owner_of(id).await?;
    let uri = app.registry.token_uri(id).await?;
    Ok(Json(TokenResponse {
        token_id: id,
        owner: owner.to_string(),
        uri,
    }))
}

#[derive(Serialize)]
struct TotalTokensResponse {
    total: u64,
}

async fn total_tokens(
    State(app): State<Arc<App>>,
) -> Result<Json<TotalTokensResponse>, ApiError> {
    let total = app.registry.total_tokens().await?;
    Ok(Json(TotalTokensResponse { total }))
}

// =============================================================================
// Errors
// =============================================================================

pub enum ApiError {
    NotFound,
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Conflict(msg) => {
                (axum::http::StatusCode::CONFLICT, msg).into_response()
            }
            ApiError::Internal(_) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
            )
                .into_response(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(_) | DomainError::Parse(_) => {
                ApiError::BadRequest(e.to_string())
            }
            DomainError::InvalidStateTransition(_) | DomainError::Constraint(_) => {
                ApiError::Conflict(e.to_string())
            }
        }
    }
}

impl From<ShopError> for ApiError {
    fn from(e: ShopError) -> Self {
        ApiError::Conflict(e.to_string())
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::Rpc(_) => ApiError::Internal(e.to_string()),
            _ => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotMinted(_) => ApiError::NotFound,
            _ => ApiError::Internal(e.to_string()),
        }
    }
}
