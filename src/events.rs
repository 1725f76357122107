//! Inbound event dispatch.
//!
//! Each frame is parsed, applied to the hub synchronously, and any durable
//! side effect is spawned afterwards. Relay never waits on the database; a
//! failed write is logged and the game plays on.

use std::future::Future;

use sea_orm::DbErr;
use uuid::Uuid;

use crate::hub::FinishedMatch;
use crate::persistence::{GAME_STATUS_ABANDONED, GAME_STATUS_FINISHED};
use crate::protocol::{ClientEvent, PlayerIdentity, ServerEvent};
use crate::rating::StatsDelta;
use crate::state::AppState;

/// Parse and apply one inbound frame from `connection`.
pub fn dispatch(state: &AppState, connection: Uuid, raw: &str) {
    let event = match serde_json::from_str::<ClientEvent>(raw) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(%connection, "rejected malformed frame: {e}");
            state.hub.send_to(
                connection,
                &ServerEvent::BadRequest {
                    message: "malformed event".to_string(),
                },
            );
            return;
        }
    };

    match event {
        ClientEvent::Register {
            identity,
            display_name,
        } => {
            let identity = PlayerIdentity {
                wallet: identity,
                display_name,
            };
            state.hub.register(connection, identity.clone());
            spawn_upsert(state, identity);
        }
        ClientEvent::FindMatch {
            identity,
            display_name,
        } => {
            let identity = PlayerIdentity {
                wallet: identity,
                display_name,
            };
            spawn_upsert(state, identity.clone());
            if let Some(paired) = state.hub.find_match(connection, identity) {
                tracing::info!(session_id = %paired.session_id, "matched players from queue");
                let persist = state.persist.clone();
                spawn_logged(async move { persist.create_game_record(&paired).await });
            }
        }
        ClientEvent::CancelMatch => state.hub.cancel_match(connection),
        ClientEvent::CreateRoom {
            identity,
            display_name,
        } => {
            let identity = PlayerIdentity {
                wallet: identity,
                display_name,
            };
            spawn_upsert(state, identity.clone());
            // Not recorded yet: the game row is written once an opponent joins.
            let session_id = state.hub.create_room(connection, identity);
            tracing::debug!(%connection, session_id, "room created");
        }
        ClientEvent::JoinRoom {
            session_id,
            identity,
            display_name,
        } => {
            let identity = PlayerIdentity {
                wallet: identity,
                display_name,
            };
            spawn_upsert(state, identity.clone());
            if let Some(paired) = state.hub.join_room(connection, &session_id, identity) {
                tracing::info!(session_id = %paired.session_id, "room filled");
                let persist = state.persist.clone();
                spawn_logged(async move { persist.create_game_record(&paired).await });
            }
        }
        ClientEvent::Move {
            session_id,
            from,
            to,
        } => {
            if let Some(recorded) = state.hub.relay_move(connection, &session_id, from, to) {
                let persist = state.persist.clone();
                spawn_logged(async move { persist.append_move(&recorded).await });
            }
        }
        ClientEvent::Chat {
            session_id,
            message,
        } => state.hub.relay_chat(connection, &session_id, message),
        ClientEvent::GameOver {
            session_id,
            winner,
            loser,
        } => {
            if let Some(finished) = state.hub.game_over(&session_id, winner, loser) {
                finalize(state, finished);
            }
        }
        ClientEvent::Resign { session_id } => {
            if let Some(finished) = state.hub.resign(connection, &session_id) {
                finalize(state, finished);
            }
        }
    }
}

/// Tear down state for a closed connection and record an abandonment if it
/// was mid-game.
pub fn handle_disconnect(state: &AppState, connection: Uuid) {
    if let Some(abandoned) = state.hub.disconnect(connection) {
        tracing::info!(session_id = %abandoned.session_id, "session abandoned on disconnect");
        let persist = state.persist.clone();
        spawn_logged(async move {
            persist
                .finish_game(
                    &abandoned.session_id,
                    GAME_STATUS_ABANDONED,
                    None,
                    abandoned.finished_at,
                )
                .await
        });
    }
}

/// Persist a concluded game and, when both parties are known, their rating
/// adjustments. A resignation costs the loser more than a normal loss.
fn finalize(state: &AppState, finished: FinishedMatch) {
    if let (Some(winner), Some(loser)) = (finished.winner.clone(), finished.loser.clone()) {
        let loser_delta = if finished.resigned {
            StatsDelta::resignation()
        } else {
            StatsDelta::loss()
        };
        let persist = state.persist.clone();
        spawn_logged(async move { persist.increment_user_stats(&winner, StatsDelta::win()).await });
        let persist = state.persist.clone();
        spawn_logged(async move { persist.increment_user_stats(&loser, loser_delta).await });
    }

    let persist = state.persist.clone();
    spawn_logged(async move {
        persist
            .finish_game(
                &finished.session_id,
                GAME_STATUS_FINISHED,
                finished.winner.as_deref(),
                finished.finished_at,
            )
            .await
    });
}

fn spawn_upsert(state: &AppState, identity: PlayerIdentity) {
    let persist = state.persist.clone();
    spawn_logged(async move { persist.upsert_user(&identity).await });
}

/// Run a durable write in the background, logging instead of surfacing
/// failures.
fn spawn_logged<F>(task: F)
where
    F: Future<Output = Result<(), DbErr>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            tracing::warn!("persistence write failed: {e}");
        }
    });
}
