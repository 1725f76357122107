mod health;
mod leaderboard;
mod players;
mod ws;

use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health` — lightweight health check (used by Railway)
/// - `GET /ws` — the real-time matchmaking and relay channel
/// - `GET /api/v1/health` — detailed health check with database connectivity
/// - `GET /api/v1/players/{wallet}` — player profile
/// - `GET /api/v1/players/{wallet}/games` — a player's recent games
/// - `GET /api/v1/leaderboard` — top players by rating
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new()
        .merge(health::api_router())
        .merge(players::router())
        .merge(leaderboard::router());

    Router::new()
        .merge(health::root_router())
        .merge(ws::router())
        .nest("/api/v1", api_v1)
}

/// Resolve an optional `limit` query parameter against a default, capped at
/// 100. Zero is rejected rather than silently returning an empty list.
pub(crate) fn resolve_limit(limit: Option<u64>, default: u64) -> Result<u64, AppError> {
    match limit {
        Some(0) => Err(AppError::BadRequest(
            "limit must be between 1 and 100".to_string(),
        )),
        Some(n) => Ok(n.min(100)),
        None => Ok(default),
    }
}
