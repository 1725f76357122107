//! In-memory hub for matchmaking and session relay.
//!
//! All mutable state (connection records, the waiting queue, live sessions)
//! sits behind one coarse mutex. Handlers take the lock, do their work, and
//! push outbound frames onto per-connection channels before releasing it;
//! nothing awaits while the lock is held. Durable writes are spawned by the
//! caller after the lock is gone, so a write may land when its session has
//! already been retired — the persistence layer treats that as a no-op.

pub mod queue;
pub mod session;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, FixedOffset, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::{PlayerIdentity, ServerEvent, Side};
use crate::utils;

use self::queue::{MatchQueue, WaitingEntry};
use self::session::{MatchKind, Session};

/// A frame destined for a specific `WebSocket` client.
pub type WsTx = mpsc::UnboundedSender<String>;

/// What the registry knows about one live connection.
#[derive(Debug, Clone, Default)]
struct ConnectionRecord {
    identity: Option<PlayerIdentity>,
    session: Option<String>,
}

/// Everything guarded by the coarse lock.
#[derive(Debug, Default)]
struct HubState {
    connections: HashMap<Uuid, ConnectionRecord>,
    queue: MatchQueue,
    sessions: HashMap<String, Session>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes handed back for persistence
// ─────────────────────────────────────────────────────────────────────────────

/// A fresh pairing, ready to be recorded as a new game.
#[derive(Debug, Clone)]
pub struct PairedMatch {
    pub session_id: String,
    pub kind: MatchKind,
    pub light: PlayerIdentity,
    pub dark: PlayerIdentity,
}

/// A move accepted into a session's log.
#[derive(Debug, Clone)]
pub struct RecordedMove {
    pub session_id: String,
    pub seq: usize,
    pub from: String,
    pub to: String,
    pub played_at: DateTime<FixedOffset>,
}

/// A session that ended with a known outcome.
///
/// `winner`/`loser` are wallet addresses. Rating updates only apply when both
/// are present.
#[derive(Debug, Clone)]
pub struct FinishedMatch {
    pub session_id: String,
    pub winner: Option<String>,
    pub loser: Option<String>,
    pub resigned: bool,
    pub finished_at: DateTime<FixedOffset>,
}

/// A session cut short by a participant dropping its connection.
#[derive(Debug, Clone)]
pub struct AbandonedMatch {
    pub session_id: String,
    pub finished_at: DateTime<FixedOffset>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Hub
// ─────────────────────────────────────────────────────────────────────────────

/// Tracks all live connections, the matchmaking queue, and active sessions.
#[derive(Debug, Clone, Default)]
pub struct Hub {
    /// connection id → sender channel; kept outside the state lock so frames
    /// can be pushed while holding it.
    senders: Arc<DashMap<Uuid, WsTx>>,
    state: Arc<Mutex<HubState>>,
}

impl Hub {
    /// Create a new empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_state(&self) -> MutexGuard<'_, HubState> {
        // Handlers never panic while holding the lock; recover state anyway
        // rather than propagate poisoning.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a new connection and broadcast the updated online count.
    pub fn connect(&self, tx: WsTx) -> Uuid {
        let connection = Uuid::new_v4();
        self.senders.insert(connection, tx);

        let mut state = self.lock_state();
        state
            .connections
            .insert(connection, ConnectionRecord::default());
        let count = state.connections.len();
        self.broadcast_all(&ServerEvent::OnlineCount { count });
        connection
    }

    /// Attach or refresh the caller-supplied identity on a connection.
    pub fn register(&self, connection: Uuid, identity: PlayerIdentity) {
        let mut state = self.lock_state();
        if let Some(record) = state.connections.get_mut(&connection) {
            record.identity = Some(identity);
        }
    }

    /// Queue the caller for a random match, or pair it with the
    /// longest-waiting entry.
    ///
    /// The earlier-waiting player takes `light`, the caller takes `dark`.
    /// Returns the pairing when one happened so the caller can persist it.
    pub fn find_match(&self, connection: Uuid, identity: PlayerIdentity) -> Option<PairedMatch> {
        let mut state = self.lock_state();
        if let Some(record) = state.connections.get_mut(&connection) {
            record.identity = Some(identity.clone());
        }

        // A re-request replaces any stale entry instead of duplicating it,
        // and guarantees the caller cannot pop itself as an opponent.
        state.queue.remove_stale(connection, &identity.wallet);

        let Some(opponent) = state.queue.pop_front() else {
            state.queue.push_back(WaitingEntry {
                connection,
                identity,
            });
            self.send_to(connection, &ServerEvent::WaitingForMatch);
            return None;
        };

        let session_id = allocate_session_id(&state.sessions);
        let session = Session::new_random(
            session_id.clone(),
            opponent.connection,
            opponent.identity.clone(),
            connection,
            identity.clone(),
        );
        state.sessions.insert(session_id.clone(), session);
        for conn in [opponent.connection, connection] {
            if let Some(record) = state.connections.get_mut(&conn) {
                // A caller still attached to an earlier session only moves
                // its own pointer; that session stays in the store for its
                // other participant and is retired through them.
                record.session = Some(session_id.clone());
            }
        }

        self.send_to(
            opponent.connection,
            &ServerEvent::MatchFound {
                session_id: session_id.clone(),
                side: Side::Light,
                opponent: identity.clone(),
            },
        );
        self.send_to(
            connection,
            &ServerEvent::MatchFound {
                session_id: session_id.clone(),
                side: Side::Dark,
                opponent: opponent.identity.clone(),
            },
        );

        Some(PairedMatch {
            session_id,
            kind: MatchKind::Random,
            light: opponent.identity,
            dark: identity,
        })
    }

    /// Drop the caller's queue entry if it is still waiting. Always
    /// acknowledged; cancelling after a pairing already happened is a no-op.
    pub fn cancel_match(&self, connection: Uuid) {
        let mut state = self.lock_state();
        state.queue.remove_connection(connection);
        self.send_to(connection, &ServerEvent::MatchCancelled);
    }

    /// Open an invite-only room owned by the caller and return its id.
    pub fn create_room(&self, connection: Uuid, identity: PlayerIdentity) -> String {
        let mut state = self.lock_state();
        if let Some(record) = state.connections.get_mut(&connection) {
            record.identity = Some(identity.clone());
        }

        let session_id = allocate_session_id(&state.sessions);
        let session = Session::new_invited(session_id.clone(), connection, identity);
        state.sessions.insert(session_id.clone(), session);
        if let Some(record) = state.connections.get_mut(&connection) {
            record.session = Some(session_id.clone());
        }

        self.send_to(
            connection,
            &ServerEvent::RoomCreated {
                session_id: session_id.clone(),
                side: Side::Light,
            },
        );
        session_id
    }

    /// Join an invite-only room by code.
    ///
    /// Join failures are reported to the caller as `room-error` and leave the
    /// room untouched. Returns the pairing when the join succeeded.
    pub fn join_room(
        &self,
        connection: Uuid,
        session_id: &str,
        identity: PlayerIdentity,
    ) -> Option<PairedMatch> {
        let code = utils::normalize_session_code(session_id);

        // A malformed code can never name a live session; reject it before
        // touching the store.
        if !utils::is_valid_session_code(&code) {
            self.send_to(
                connection,
                &ServerEvent::RoomError {
                    message: session::JoinError::NotFound.message().to_string(),
                },
            );
            return None;
        }

        let mut state = self.lock_state();
        if let Some(record) = state.connections.get_mut(&connection) {
            record.identity = Some(identity.clone());
        }

        let Some(sess) = state.sessions.get_mut(&code) else {
            self.send_to(
                connection,
                &ServerEvent::RoomError {
                    message: session::JoinError::NotFound.message().to_string(),
                },
            );
            return None;
        };
        if let Err(err) = sess.fill_second(connection, identity.clone()) {
            self.send_to(
                connection,
                &ServerEvent::RoomError {
                    message: err.message().to_string(),
                },
            );
            return None;
        }
        let creator = sess.first.connection;
        let creator_identity = sess.first.identity.clone();

        if let Some(record) = state.connections.get_mut(&connection) {
            record.session = Some(code.clone());
        }

        self.send_to(
            connection,
            &ServerEvent::RoomJoined {
                session_id: code.clone(),
                side: Side::Dark,
                opponent: creator_identity.clone(),
            },
        );
        self.send_to(
            creator,
            &ServerEvent::OpponentJoined {
                opponent: identity.clone(),
            },
        );

        Some(PairedMatch {
            session_id: code,
            kind: MatchKind::Invited,
            light: creator_identity,
            dark: identity,
        })
    }

    /// Append a move to the session log and relay it to everyone in the
    /// session except the sender. Silently ignored when the session is gone.
    pub fn relay_move(
        &self,
        connection: Uuid,
        session_id: &str,
        from: String,
        to: String,
    ) -> Option<RecordedMove> {
        let mut state = self.lock_state();
        let sess = state.sessions.get_mut(session_id)?;

        let (seq, played_at) = sess.append_move(from.clone(), to.clone());
        let event = ServerEvent::Move {
            from: from.clone(),
            to: to.clone(),
        };
        let canonical_id = sess.id.clone();
        let peers: Vec<Uuid> = sess
            .participants()
            .filter(|p| p.connection != connection)
            .map(|p| p.connection)
            .collect();
        for peer in peers {
            self.send_to(peer, &event);
        }

        Some(RecordedMove {
            session_id: canonical_id,
            seq,
            from,
            to,
            played_at,
        })
    }

    /// Relay a chat line, stamped with the sender's display name and the
    /// send time, to everyone in the session except the sender. Chat is never
    /// persisted.
    pub fn relay_chat(&self, connection: Uuid, session_id: &str, message: String) {
        let state = self.lock_state();
        let Some(sess) = state.sessions.get(session_id) else {
            return;
        };

        let display_name = sess
            .participant(connection)
            .map(|p| p.identity.display_name.clone())
            .or_else(|| {
                state
                    .connections
                    .get(&connection)
                    .and_then(|record| record.identity.as_ref())
                    .map(|identity| identity.display_name.clone())
            })
            .unwrap_or_else(|| "anonymous".to_string());

        let event = ServerEvent::Chat {
            display_name,
            message,
            timestamp: Utc::now().to_rfc3339(),
        };
        for peer in sess.participants().filter(|p| p.connection != connection) {
            self.send_to(peer.connection, &event);
        }
    }

    /// Conclude a game with a reported outcome: broadcast the result to the
    /// whole session and retire it. Silently ignored when the session is
    /// gone.
    pub fn game_over(
        &self,
        session_id: &str,
        winner: Option<String>,
        loser: Option<String>,
    ) -> Option<FinishedMatch> {
        let mut state = self.lock_state();
        let mut sess = state.sessions.remove(session_id)?;
        sess.finish();
        let finished_at = Utc::now().fixed_offset();

        let event = ServerEvent::GameEnded {
            winner: winner.clone(),
        };
        for participant in sess.participants() {
            self.send_to(participant.connection, &event);
            if let Some(record) = state.connections.get_mut(&participant.connection)
                && record.session.as_deref() == Some(sess.id.as_str())
            {
                record.session = None;
            }
        }

        Some(FinishedMatch {
            session_id: sess.id,
            winner,
            loser,
            resigned: false,
            finished_at,
        })
    }

    /// Concede on behalf of `connection`: the other slot wins. Broadcasts the
    /// resignation to the whole session and retires it.
    pub fn resign(&self, connection: Uuid, session_id: &str) -> Option<FinishedMatch> {
        let mut state = self.lock_state();
        let mut sess = state.sessions.remove(session_id)?;
        sess.finish();
        let finished_at = Utc::now().fixed_offset();

        let (winner, loser) = sess.resign_outcome(connection);
        let resigned_identity = loser.clone().unwrap_or_else(|| winner.clone());
        let event = ServerEvent::PlayerResigned {
            resigned_identity: resigned_identity.wallet,
            winner: winner.wallet.clone(),
        };
        for participant in sess.participants() {
            self.send_to(participant.connection, &event);
            if let Some(record) = state.connections.get_mut(&participant.connection)
                && record.session.as_deref() == Some(sess.id.as_str())
            {
                record.session = None;
            }
        }

        Some(FinishedMatch {
            session_id: sess.id,
            winner: Some(winner.wallet),
            loser: loser.map(|identity| identity.wallet),
            resigned: true,
            finished_at,
        })
    }

    /// Tear down a dropped connection: broadcast the new online count, drop
    /// any queue entry, and abandon the session it was part of. Idempotent —
    /// a second call for the same connection does nothing.
    pub fn disconnect(&self, connection: Uuid) -> Option<AbandonedMatch> {
        self.senders.remove(&connection);

        let mut state = self.lock_state();
        let record = state.connections.remove(&connection)?;
        let count = state.connections.len();
        self.broadcast_all(&ServerEvent::OnlineCount { count });

        state.queue.remove_connection(connection);

        let session_id = record.session?;
        let mut sess = state.sessions.remove(&session_id)?;
        sess.finish();
        let finished_at = Utc::now().fixed_offset();
        for participant in sess.participants().filter(|p| p.connection != connection) {
            self.send_to(participant.connection, &ServerEvent::OpponentDisconnected);
            if let Some(peer) = state.connections.get_mut(&participant.connection)
                && peer.session.as_deref() == Some(sess.id.as_str())
            {
                peer.session = None;
            }
        }

        Some(AbandonedMatch {
            session_id: sess.id,
            finished_at,
        })
    }

    /// Push one event to a single connection. Frames for closed or unknown
    /// connections are dropped.
    pub fn send_to(&self, connection: Uuid, event: &ServerEvent) {
        if let Some(payload) = encode(event)
            && let Some(tx) = self.senders.get(&connection)
        {
            let _ = tx.send(payload);
        }
    }

    /// Push one event to every open connection.
    fn broadcast_all(&self, event: &ServerEvent) {
        if let Some(payload) = encode(event) {
            for entry in self.senders.iter() {
                let _ = entry.value().send(payload.clone());
            }
        }
    }
}

/// Serialize an outbound event, logging instead of failing the handler when
/// encoding breaks.
fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::error!("failed to encode server event: {e}");
            None
        }
    }
}

/// Draw a session code not currently in use, widening the code length if the
/// space ever looks saturated.
fn allocate_session_id(sessions: &HashMap<String, Session>) -> String {
    let mut length = utils::default_code_length();
    loop {
        for _ in 0..20 {
            let code = utils::random_session_code(length);
            if !sessions.contains_key(&code) {
                return code;
            }
        }
        length += 1;
    }
}
