//! End-to-end tests driving the WebSocket channel against a real server on an
//! ephemeral port, with an in-memory database behind it.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use duelboard_api::state::AppState;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the app on an ephemeral port and return the WebSocket URL plus the
/// state, so tests can poll the database behind the fire-and-forget writes.
async fn spawn_server() -> anyhow::Result<(String, AppState)> {
    let state = common::test_state().await;
    let app = duelboard_api::routes::router().with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("ws://{addr}/ws"), state))
}

async fn connect(url: &str) -> anyhow::Result<Client> {
    let (client, _) = connect_async(url).await?;
    Ok(client)
}

async fn send(client: &mut Client, frame: &Value) -> anyhow::Result<()> {
    client.send(Message::text(frame.to_string())).await?;
    Ok(())
}

/// The next text frame, parsed. Fails rather than hanging when nothing comes.
async fn recv(client: &mut Client) -> anyhow::Result<Value> {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await?
            .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
        if let Message::Text(raw) = message {
            return Ok(serde_json::from_str(raw.as_str())?);
        }
    }
}

/// Assert that no frame arrives within a short window.
async fn recv_nothing(client: &mut Client) {
    let quiet = tokio::time::timeout(Duration::from_millis(300), client.next()).await;
    assert!(quiet.is_err(), "expected silence, got {quiet:?}");
}

/// Retry a database check until it passes; the relay never waits for its
/// durable writes, so tests must not either.
async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

async fn rating_of(state: &AppState, wallet: &str) -> Option<i32> {
    state
        .persist
        .find_player(wallet)
        .await
        .unwrap_or_default()
        .map(|p| p.rating)
}

/// Pair two fresh clients through the random queue, draining their
/// notification backlogs, and return them with the shared session id.
async fn paired_clients(url: &str) -> anyhow::Result<(Client, Client, String)> {
    let mut alice = connect(url).await?;
    assert_eq!(recv(&mut alice).await?["type"], "online-count");
    let mut bob = connect(url).await?;
    assert_eq!(recv(&mut alice).await?["type"], "online-count");
    assert_eq!(recv(&mut bob).await?["type"], "online-count");

    send(
        &mut alice,
        &json!({"type": "find-match", "payload": {"identity": "0xaaa", "displayName": "Alice"}}),
    )
    .await?;
    assert_eq!(recv(&mut alice).await?["type"], "waiting-for-match");

    send(
        &mut bob,
        &json!({"type": "find-match", "payload": {"identity": "0xbbb", "displayName": "Bob"}}),
    )
    .await?;

    let found_a = recv(&mut alice).await?;
    let found_b = recv(&mut bob).await?;
    assert_eq!(found_a["type"], "match-found");
    assert_eq!(found_a["payload"]["side"], "light");
    assert_eq!(found_a["payload"]["opponent"]["identity"], "0xbbb");
    assert_eq!(found_b["type"], "match-found");
    assert_eq!(found_b["payload"]["side"], "dark");
    assert_eq!(found_b["payload"]["opponent"]["identity"], "0xaaa");
    assert_eq!(found_a["payload"]["sessionId"], found_b["payload"]["sessionId"]);

    let session_id = found_a["payload"]["sessionId"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert_eq!(session_id.len(), 8);
    Ok((alice, bob, session_id))
}

#[tokio::test]
async fn full_match_from_queue_to_resignation() -> anyhow::Result<()> {
    let (url, state) = spawn_server().await?;
    let (mut alice, mut bob, session_id) = paired_clients(&url).await?;

    // Moves reach the opponent only, in order.
    send(
        &mut alice,
        &json!({"type": "move", "payload": {"sessionId": session_id, "from": "e2", "to": "e4"}}),
    )
    .await?;
    let relayed = recv(&mut bob).await?;
    assert_eq!(relayed["type"], "move");
    assert_eq!(relayed["payload"]["from"], "e2");
    assert_eq!(relayed["payload"]["to"], "e4");

    send(
        &mut bob,
        &json!({"type": "chat", "payload": {"sessionId": session_id, "message": "gl hf"}}),
    )
    .await?;
    let chat = recv(&mut alice).await?;
    assert_eq!(chat["type"], "chat");
    assert_eq!(chat["payload"]["displayName"], "Bob");
    assert_eq!(chat["payload"]["message"], "gl hf");

    // The pairing's game record is written in the background; let it land so
    // the finish has a row to update.
    let game_id = session_id.clone();
    assert!(
        eventually(|| async {
            state
                .persist
                .query_user_games("0xaaa", 10)
                .await
                .unwrap_or_default()
                .iter()
                .any(|g| g.id == game_id)
        })
        .await
    );

    // Alice concedes: Bob wins, both hear about it.
    send(
        &mut alice,
        &json!({"type": "resign", "payload": {"sessionId": session_id}}),
    )
    .await?;
    for client in [&mut alice, &mut bob] {
        let resigned = recv(client).await?;
        assert_eq!(resigned["type"], "player-resigned");
        assert_eq!(resigned["payload"]["resignedIdentity"], "0xaaa");
        assert_eq!(resigned["payload"]["winner"], "0xbbb");
    }

    // The session is gone; stale frames are dropped without a reply.
    send(
        &mut bob,
        &json!({"type": "move", "payload": {"sessionId": session_id, "from": "e7", "to": "e5"}}),
    )
    .await?;
    recv_nothing(&mut alice).await;

    // Resignation rating policy lands durably: +25 / -20.
    assert!(eventually(|| async { rating_of(&state, "0xbbb").await == Some(1225) }).await);
    assert!(eventually(|| async { rating_of(&state, "0xaaa").await == Some(1180) }).await);
    assert!(
        eventually(|| async {
            let games = state
                .persist
                .query_user_games("0xbbb", 10)
                .await
                .unwrap_or_default();
            games
                .first()
                .is_some_and(|g| g.status == "finished" && g.winner.as_deref() == Some("0xbbb"))
        })
        .await
    );
    Ok(())
}

#[tokio::test]
async fn reported_game_over_applies_the_normal_deltas() -> anyhow::Result<()> {
    let (url, state) = spawn_server().await?;
    let (mut alice, mut bob, session_id) = paired_clients(&url).await?;

    send(
        &mut bob,
        &json!({
            "type": "game-over",
            "payload": {"sessionId": session_id, "winner": "0xbbb", "loser": "0xaaa"},
        }),
    )
    .await?;
    for client in [&mut alice, &mut bob] {
        let ended = recv(client).await?;
        assert_eq!(ended["type"], "game-ended");
        assert_eq!(ended["payload"]["winner"], "0xbbb");
    }

    // Normal outcome: +25 / -15.
    assert!(eventually(|| async { rating_of(&state, "0xbbb").await == Some(1225) }).await);
    assert!(eventually(|| async { rating_of(&state, "0xaaa").await == Some(1185) }).await);
    Ok(())
}

#[tokio::test]
async fn room_lifecycle_with_join_errors() -> anyhow::Result<()> {
    let (url, _state) = spawn_server().await?;

    let mut carol = connect(&url).await?;
    assert_eq!(recv(&mut carol).await?["type"], "online-count");
    send(
        &mut carol,
        &json!({"type": "create-room", "payload": {"identity": "0xccc", "displayName": "Carol"}}),
    )
    .await?;
    let created = recv(&mut carol).await?;
    assert_eq!(created["type"], "room-created");
    assert_eq!(created["payload"]["side"], "light");
    let session_id = created["payload"]["sessionId"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    let mut dave = connect(&url).await?;
    assert_eq!(recv(&mut carol).await?["type"], "online-count");
    assert_eq!(recv(&mut dave).await?["type"], "online-count");

    send(
        &mut dave,
        &json!({
            "type": "join-room",
            "payload": {"sessionId": "WRONGCODE", "identity": "0xddd", "displayName": "Dave"},
        }),
    )
    .await?;
    let missed = recv(&mut dave).await?;
    assert_eq!(missed["type"], "room-error");
    assert_eq!(missed["payload"]["message"], "Room not found");

    send(
        &mut dave,
        &json!({
            "type": "join-room",
            "payload": {"sessionId": session_id, "identity": "0xddd", "displayName": "Dave"},
        }),
    )
    .await?;
    let joined = recv(&mut dave).await?;
    assert_eq!(joined["type"], "room-joined");
    assert_eq!(joined["payload"]["side"], "dark");
    assert_eq!(joined["payload"]["opponent"]["identity"], "0xccc");
    let opponent = recv(&mut carol).await?;
    assert_eq!(opponent["type"], "opponent-joined");
    assert_eq!(opponent["payload"]["opponent"]["identity"], "0xddd");

    // A third joiner is turned away and the game carries on.
    let mut eve = connect(&url).await?;
    assert_eq!(recv(&mut carol).await?["type"], "online-count");
    assert_eq!(recv(&mut dave).await?["type"], "online-count");
    assert_eq!(recv(&mut eve).await?["type"], "online-count");
    send(
        &mut eve,
        &json!({
            "type": "join-room",
            "payload": {"sessionId": session_id, "identity": "0xeee", "displayName": "Eve"},
        }),
    )
    .await?;
    let full = recv(&mut eve).await?;
    assert_eq!(full["type"], "room-error");
    assert_eq!(full["payload"]["message"], "Room is full");

    send(
        &mut carol,
        &json!({"type": "move", "payload": {"sessionId": session_id, "from": "d2", "to": "d4"}}),
    )
    .await?;
    assert_eq!(recv(&mut dave).await?["type"], "move");
    recv_nothing(&mut eve).await;
    Ok(())
}

#[tokio::test]
async fn disconnect_abandons_the_session_without_rating_changes() -> anyhow::Result<()> {
    let (url, state) = spawn_server().await?;
    let (mut alice, mut bob, session_id) = paired_clients(&url).await?;

    // Wait for the game record so the abandonment has a row to mark.
    let game_id = session_id.clone();
    assert!(
        eventually(|| async {
            state
                .persist
                .query_user_games("0xaaa", 10)
                .await
                .unwrap_or_default()
                .iter()
                .any(|g| g.id == game_id)
        })
        .await
    );

    alice.close(None).await?;

    let count = recv(&mut bob).await?;
    assert_eq!(count["type"], "online-count");
    assert_eq!(count["payload"]["count"], 1);
    assert_eq!(recv(&mut bob).await?["type"], "opponent-disconnected");

    // Abandonment is terminal but unrated.
    assert!(
        eventually(|| async {
            state
                .persist
                .query_user_games("0xaaa", 10)
                .await
                .unwrap_or_default()
                .first()
                .is_some_and(|g| g.status == "abandoned" && g.winner.is_none())
        })
        .await
    );
    assert_eq!(rating_of(&state, "0xaaa").await, Some(1200));
    assert_eq!(rating_of(&state, "0xbbb").await, Some(1200));

    // Frames against the retired session go nowhere.
    send(
        &mut bob,
        &json!({"type": "move", "payload": {"sessionId": session_id, "from": "e7", "to": "e5"}}),
    )
    .await?;
    recv_nothing(&mut bob).await;
    Ok(())
}

#[tokio::test]
async fn cancel_leaves_the_queue_empty() -> anyhow::Result<()> {
    let (url, _state) = spawn_server().await?;

    let mut alice = connect(&url).await?;
    assert_eq!(recv(&mut alice).await?["type"], "online-count");
    send(
        &mut alice,
        &json!({"type": "find-match", "payload": {"identity": "0xaaa", "displayName": "Alice"}}),
    )
    .await?;
    assert_eq!(recv(&mut alice).await?["type"], "waiting-for-match");

    send(&mut alice, &json!({"type": "cancel-match"})).await?;
    assert_eq!(recv(&mut alice).await?["type"], "match-cancelled");

    // The next seeker finds nobody waiting.
    let mut bob = connect(&url).await?;
    assert_eq!(recv(&mut alice).await?["type"], "online-count");
    assert_eq!(recv(&mut bob).await?["type"], "online-count");
    send(
        &mut bob,
        &json!({"type": "find-match", "payload": {"identity": "0xbbb", "displayName": "Bob"}}),
    )
    .await?;
    assert_eq!(recv(&mut bob).await?["type"], "waiting-for-match");
    recv_nothing(&mut alice).await;
    Ok(())
}

#[tokio::test]
async fn malformed_frames_get_a_bad_request_reply() -> anyhow::Result<()> {
    let (url, _state) = spawn_server().await?;

    let mut alice = connect(&url).await?;
    assert_eq!(recv(&mut alice).await?["type"], "online-count");

    send(&mut alice, &json!({"type": "teleport", "payload": {}})).await?;
    assert_eq!(recv(&mut alice).await?["type"], "bad-request");

    // A known type with a missing required field is rejected the same way.
    send(
        &mut alice,
        &json!({"type": "move", "payload": {"sessionId": "K7PQ2XWM", "from": "e2"}}),
    )
    .await?;
    assert_eq!(recv(&mut alice).await?["type"], "bad-request");

    // The connection stays usable afterwards.
    send(
        &mut alice,
        &json!({"type": "find-match", "payload": {"identity": "0xaaa", "displayName": "Alice"}}),
    )
    .await?;
    assert_eq!(recv(&mut alice).await?["type"], "waiting-for-match");
    Ok(())
}
