//! Wire protocol for the real-time channel.
//!
//! Every frame is a JSON object of the form `{"type": "...", "payload": {...}}`
//! with kebab-case event names and camelCase payload fields. Events without a
//! payload omit the `payload` key entirely.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Shared types
// ─────────────────────────────────────────────────────────────────────────────

/// A player as presented by the client: wallet address plus display name.
///
/// The wallet address is the durable key for a player across sessions; the
/// display name is cosmetic and may change between connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdentity {
    #[serde(rename = "identity")]
    pub wallet: String,
    pub display_name: String,
}

/// Which side of the board a participant plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Light,
    Dark,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client → server events
// ─────────────────────────────────────────────────────────────────────────────

/// Events a client may send over the `WebSocket`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Attach or update the caller's identity on this connection.
    #[serde(rename_all = "camelCase")]
    Register { identity: String, display_name: String },
    /// Enter the matchmaking queue, or pair immediately if someone is waiting.
    #[serde(rename_all = "camelCase")]
    FindMatch { identity: String, display_name: String },
    /// Leave the matchmaking queue if still waiting.
    CancelMatch,
    /// Create an invite-only room and wait for an opponent.
    #[serde(rename_all = "camelCase")]
    CreateRoom { identity: String, display_name: String },
    /// Join an invite-only room by its session id.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        session_id: String,
        identity: String,
        display_name: String,
    },
    /// Relay a move to the opponent. `from`/`to` are opaque square tokens;
    /// no legality check happens server-side.
    #[serde(rename_all = "camelCase")]
    Move {
        session_id: String,
        from: String,
        to: String,
    },
    /// Relay a chat line to the opponent.
    #[serde(rename_all = "camelCase")]
    Chat { session_id: String, message: String },
    /// Report a concluded game with its winner and loser identities.
    #[serde(rename_all = "camelCase")]
    GameOver {
        session_id: String,
        winner: Option<String>,
        loser: Option<String>,
    },
    /// Concede the game.
    #[serde(rename_all = "camelCase")]
    Resign { session_id: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Server → client events
// ─────────────────────────────────────────────────────────────────────────────

/// Events the server may push to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Sent to both players of a fresh random pairing.
    #[serde(rename_all = "camelCase")]
    MatchFound {
        session_id: String,
        side: Side,
        opponent: PlayerIdentity,
    },
    /// Sent when the queue was empty and the caller is now waiting.
    WaitingForMatch,
    /// Acknowledges a cancel request, whether or not an entry was removed.
    MatchCancelled,
    /// Sent to the creator of an invite-only room.
    #[serde(rename_all = "camelCase")]
    RoomCreated { session_id: String, side: Side },
    /// Sent to a joiner whose join succeeded.
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        session_id: String,
        side: Side,
        opponent: PlayerIdentity,
    },
    /// Sent to the room creator when an opponent joins.
    #[serde(rename_all = "camelCase")]
    OpponentJoined { opponent: PlayerIdentity },
    /// Sent to a joiner whose join failed.
    #[serde(rename_all = "camelCase")]
    RoomError { message: String },
    /// An opponent's move, relayed verbatim.
    #[serde(rename_all = "camelCase")]
    Move { from: String, to: String },
    /// An opponent's chat line with sender name and send time.
    #[serde(rename_all = "camelCase")]
    Chat {
        display_name: String,
        message: String,
        timestamp: String,
    },
    /// The game concluded normally.
    #[serde(rename_all = "camelCase")]
    GameEnded { winner: Option<String> },
    /// A participant resigned; the remaining player wins.
    #[serde(rename_all = "camelCase")]
    PlayerResigned {
        resigned_identity: String,
        winner: String,
    },
    /// Current number of open connections, pushed to everyone on each
    /// connect and disconnect.
    #[serde(rename_all = "camelCase")]
    OnlineCount { count: usize },
    /// The other participant's connection dropped; the session is gone.
    OpponentDisconnected,
    /// The last inbound frame could not be understood.
    #[serde(rename_all = "camelCase")]
    BadRequest { message: String },
}
