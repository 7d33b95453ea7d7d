use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RootInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub docs: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub services: ServiceStatus,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub trending_stock: &'static str,
    pub news: &'static str,
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
}

async fn root() -> Json<RootInfo> {
    Json(RootInfo {
        message: "Good Morning Wall Street API",
        version: env!("CARGO_PKG_VERSION"),
        docs: "/api/health",
    })
}

async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        services: ServiceStatus {
            trending_stock: "available",
            news: if state.news_available() {
                "available"
            } else {
                "unavailable (API key required)"
            },
        },
    })
}
