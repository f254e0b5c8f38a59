//! Block Home Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::HeaderValue;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blockhome_domain::Address;
use blockhome_engine::api;
use blockhome_engine::app::App;
use blockhome_engine::infrastructure::ipfs::{IpfsClient, DEFAULT_IPFS_API_URL};
use blockhome_engine::infrastructure::ollama::{
    OllamaClient, DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL,
};
use blockhome_engine::infrastructure::ports::{
    LlmPort, PinStorePort, TokenRegistryPort, WalletProviderPort,
};
use blockhome_engine::infrastructure::provider::DevProvider;
use blockhome_engine::infrastructure::registry::{InMemoryRegistry, MintPolicy};

/// Well-known local development account.
const DEFAULT_DEV_ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const DEFAULT_DEV_BALANCE_WEI: u128 = 10_000_000_000_000_000_000; // 10 ETH
const DEFAULT_CHAIN_ID: u64 = 31337;

struct EngineConfig {
    host: String,
    port: u16,
    ipfs_api_url: String,
    ipfs_fallback_api_url: Option<String>,
    gateways: Vec<String>,
    ollama_url: String,
    ollama_model: String,
    chain_id: u64,
    dev_account: Address,
    mint_policy: MintPolicy,
    wallet_enabled: bool,
}

impl EngineConfig {
    fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("SERVER_PORT")
            .or_else(|_| std::env::var("PORT"))
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .unwrap_or(3000);

        let ipfs_api_url =
            std::env::var("IPFS_API_URL").unwrap_or_else(|_| DEFAULT_IPFS_API_URL.into());
        let ipfs_fallback_api_url = std::env::var("IPFS_FALLBACK_API_URL").ok();
        let gateways = std::env::var("IPFS_GATEWAYS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let ollama_url = std::env::var("OLLAMA_URL")
            .or_else(|_| std::env::var("OLLAMA_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.into());
        let ollama_model =
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.into());

        let chain_id = std::env::var("CHAIN_ID")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CHAIN_ID);

        let dev_account = Address::new(
            std::env::var("DEV_ACCOUNT").unwrap_or_else(|_| DEFAULT_DEV_ACCOUNT.into()),
        )
        .map_err(|e| anyhow::anyhow!("DEV_ACCOUNT: {e}"))?;

        let mint_policy = match std::env::var("MINT_POLICY").as_deref() {
            Ok("operator") => {
                let operator = std::env::var("OPERATOR_ADDRESS")
                    .map_err(|_| anyhow::anyhow!("MINT_POLICY=operator needs OPERATOR_ADDRESS"))
                    .and_then(|s| {
                        Address::new(s).map_err(|e| anyhow::anyhow!("OPERATOR_ADDRESS: {e}"))
                    })?;
                MintPolicy::OperatorOnly(operator)
            }
            // The upstream contract left mint unrestricted.
            _ => MintPolicy::Open,
        };

        let wallet_enabled = std::env::var("WALLET_PROVIDER")
            .map(|s| s != "none")
            .unwrap_or(true);

        Ok(Self {
            host,
            port,
            ipfs_api_url,
            ipfs_fallback_api_url,
            gateways,
            ollama_url,
            ollama_model,
            chain_id,
            dev_account,
            mint_policy,
            wallet_enabled,
        })
    }
}

fn build_app(config: &EngineConfig, reload: watch::Sender<u64>) -> App {
    let pin_store: Arc<dyn PinStorePort> = Arc::new(IpfsClient::new(
        &config.ipfs_api_url,
        config.ipfs_fallback_api_url.as_deref(),
        config.gateways.clone(),
    ));

    let registry: Arc<dyn TokenRegistryPort> =
        Arc::new(InMemoryRegistry::new(config.mint_policy.clone()));

    let provider: Option<Arc<dyn WalletProviderPort>> = if config.wallet_enabled {
        Some(Arc::new(DevProvider::new(
            config.dev_account.clone(),
            DEFAULT_DEV_BALANCE_WEI,
            config.chain_id,
        )))
    } else {
        None
    };

    let llm: Arc<dyn LlmPort> =
        Arc::new(OllamaClient::new(&config.ollama_url, &config.ollama_model));

    App::new(pin_store, registry, provider, llm, reload)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local overrides first.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blockhome_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Block Home Engine");

    // Contract bindings are network-specific: when the provider switches
    // chains the wallet session bumps the reload signal and the whole
    // application context is rebuilt.
    loop {
        let config = EngineConfig::from_env()?;
        let (reload_tx, mut reload_rx) = watch::channel(0u64);
        let app = Arc::new(build_app(&config, reload_tx));

        let mut router = api::http::routes()
            .with_state(app)
            .layer(TraceLayer::new_for_http());
        if let Some(cors) = build_cors_layer_from_env() {
            router = router.layer(cors);
        }

        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
        tracing::info!("Listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;

        let reload_requested = Arc::new(AtomicBool::new(false));
        let shutdown_flag = reload_requested.clone();
        let shutdown = async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                changed = reload_rx.changed() => {
                    if changed.is_ok() {
                        shutdown_flag.store(true, Ordering::SeqCst);
                    }
                }
            }
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        if reload_requested.load(Ordering::SeqCst) {
            tracing::warn!("Network changed, rebuilding application context");
            continue;
        }

        tracing::info!("Shutting down");
        return Ok(());
    }
}

fn build_cors_layer_from_env() -> Option<CorsLayer> {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let allowed_origins = allowed_origins?;

    let mut cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
