//! HTTP surface for the trending-stock and briefing services.

mod briefing_routes;
mod health_routes;
mod stock_routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use briefing_pipeline::ArtifactStore;
use market_core::{MarketError, NewsProvider, QuoteProvider};
use news_client::{ExaClient, NewsService};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use yahoo_client::YahooClient;

pub use briefing_routes::briefing_routes;
pub use health_routes::health_routes;
pub use stock_routes::stock_routes;

const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:3001",
];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub output_dir: Option<String>,
    pub exa_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", raw, e))?,
            None => 8000,
        };

        let cors_origins = match get("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            cors_origins,
            output_dir: get("OUTPUT_DIR"),
            exa_api_key: get("EXA_API_KEY"),
        })
    }

    pub fn news_configured(&self) -> bool {
        self.exa_api_key.is_some()
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub type SharedNewsService = NewsService<Arc<dyn NewsProvider>>;

#[derive(Clone)]
pub struct AppState {
    pub quotes: Arc<dyn QuoteProvider>,
    /// `None` when no news API key is configured.
    pub news: Option<SharedNewsService>,
    pub store: ArtifactStore,
}

impl AppState {
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        news: Option<Arc<dyn NewsProvider>>,
        store: ArtifactStore,
    ) -> Self {
        Self {
            quotes,
            news: news.map(NewsService::new),
            store,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let news: Option<Arc<dyn NewsProvider>> = match &config.exa_api_key {
            Some(key) => Some(Arc::new(ExaClient::new(key.clone()))),
            None => {
                tracing::warn!("EXA_API_KEY not set; news lookups are disabled");
                None
            }
        };
        let store = match &config.output_dir {
            Some(dir) => ArtifactStore::new(dir),
            None => ArtifactStore::from_env(),
        };
        Self::new(Arc::new(YahooClient::new()), news, store)
    }

    pub fn news_available(&self) -> bool {
        self.news.is_some()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Handler error rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: anyhow::Error,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: anyhow::anyhow!(message.into()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
        }
    }
}

impl From<MarketError> for AppError {
    fn from(error: MarketError) -> Self {
        let status = match &error {
            MarketError::InvalidScreenType(_) | MarketError::InvalidTicker(_) => {
                StatusCode::BAD_REQUEST
            }
            MarketError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            error: error.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        }
        let body = Json(serde_json::json!({ "detail": self.error.to_string() }));
        (self.status, body).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router and server
// ---------------------------------------------------------------------------

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(stock_routes())
        .merge(briefing_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    market_core::init_tracing("info,tower_http=info");

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config);
    tracing::info!(
        "News service: {}",
        if state.news_available() { "available" } else { "unavailable" }
    );

    let app = build_router(state, &config.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}
