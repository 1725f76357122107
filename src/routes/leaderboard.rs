use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::entities::player;
use crate::error::AppError;
use crate::state::AppState;

/// Build the leaderboard route group.
pub fn router() -> Router<AppState> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardEntry {
    rank: u64,
    identity: String,
    display_name: String,
    rating: i32,
    wins: i32,
    losses: i32,
    games_played: i32,
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<u64>,
}

fn entry(rank: u64, model: player::Model) -> LeaderboardEntry {
    LeaderboardEntry {
        rank,
        identity: model.wallet,
        display_name: model.display_name,
        rating: model.rating,
        wins: model.wins,
        losses: model.losses,
        games_played: model.games_played,
    }
}

/// `GET /api/v1/leaderboard?limit=` — players ordered by rating descending.
/// Default 10, capped at 100.
async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let limit = super::resolve_limit(query.limit, 10)?;
    let players = state.persist.query_leaderboard(limit).await?;
    Ok(Json(
        players
            .into_iter()
            .zip(1u64..)
            .map(|(model, rank)| entry(rank, model))
            .collect(),
    ))
}
