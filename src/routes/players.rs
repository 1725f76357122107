use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::entities::{game, player};
use crate::error::AppError;
use crate::state::AppState;

/// Build the player route group: `/players/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players/{wallet}", get(get_profile))
        .route("/players/{wallet}/games", get(get_games))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    identity: String,
    display_name: String,
    rating: i32,
    wins: i32,
    losses: i32,
    games_played: i32,
    created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameSummary {
    session_id: String,
    light: String,
    dark: String,
    kind: String,
    status: String,
    winner: Option<String>,
    created_at: String,
    finished_at: Option<String>,
}

#[derive(Deserialize)]
struct GamesQuery {
    limit: Option<u64>,
}

impl From<player::Model> for ProfileResponse {
    fn from(model: player::Model) -> Self {
        Self {
            identity: model.wallet,
            display_name: model.display_name,
            rating: model.rating,
            wins: model.wins,
            losses: model.losses,
            games_played: model.games_played,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

impl From<game::Model> for GameSummary {
    fn from(model: game::Model) -> Self {
        Self {
            session_id: model.id,
            light: model.light_wallet,
            dark: model.dark_wallet,
            kind: model.kind,
            status: model.status,
            winner: model.winner,
            created_at: model.created_at.to_rfc3339(),
            finished_at: model.finished_at.map(|at| at.to_rfc3339()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/players/{wallet}` — profile and lifetime stats.
async fn get_profile(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let Some(model) = state.persist.find_player(&wallet).await? else {
        return Err(AppError::NotFound("Player not found".to_string()));
    };
    Ok(Json(model.into()))
}

/// `GET /api/v1/players/{wallet}/games?limit=` — recent games on either side
/// of the board, newest first. Default 20, capped at 100.
async fn get_games(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(query): Query<GamesQuery>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    let limit = super::resolve_limit(query.limit, 20)?;
    let games = state.persist.query_user_games(&wallet, limit).await?;
    Ok(Json(games.into_iter().map(Into::into).collect()))
}
