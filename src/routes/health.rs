use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailedHealthResponse {
    status: &'static str,
    version: &'static str,
    database: DatabaseHealth,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseHealth {
    connected: bool,
    latency_ms: u128,
}

/// Lightweight liveness probe; never touches the database.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Full health check including a database round trip.
async fn api_health(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let started = Instant::now();
    let connected = state.db.ping().await.is_ok();

    Json(DetailedHealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: DatabaseHealth {
            connected,
            latency_ms: started.elapsed().as_millis(),
        },
    })
}

/// Route group mounted at the server root.
pub fn root_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Route group mounted under `/api/v1`.
pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(api_health))
}
