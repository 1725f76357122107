//! In-memory session records and their lifecycle.

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::protocol::{PlayerIdentity, Side};

/// Lifecycle of a session. Only ever advances; a finished session is removed
/// from the store rather than kept around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Waiting,
    Playing,
    Finished,
}

/// How the two participants found each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Random,
    Invited,
}

impl MatchKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Invited => "invited",
        }
    }
}

/// Why a join attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    NotFound,
    RoomFull,
}

impl JoinError {
    /// Message surfaced to the client in a `room-error` event.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotFound => "Room not found",
            Self::RoomFull => "Room is full",
        }
    }
}

/// One occupied participant slot.
#[derive(Debug, Clone)]
pub struct Participant {
    pub connection: Uuid,
    pub identity: PlayerIdentity,
    pub side: Side,
}

/// A move as appended to the session's log.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    pub from: String,
    pub to: String,
    pub played_at: DateTime<FixedOffset>,
}

/// The authoritative in-memory record of one two-player game.
///
/// The first slot is always the earlier arrival and plays `light`; the second
/// slot, once filled, plays `dark`.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub kind: MatchKind,
    pub status: SessionStatus,
    pub first: Participant,
    pub second: Option<Participant>,
    pub moves: Vec<MoveRecord>,
    pub created_at: DateTime<FixedOffset>,
}

impl Session {
    /// A queue pairing: both slots filled, already playing.
    #[must_use]
    pub fn new_random(
        id: String,
        first_connection: Uuid,
        first_identity: PlayerIdentity,
        second_connection: Uuid,
        second_identity: PlayerIdentity,
    ) -> Self {
        Self {
            id,
            kind: MatchKind::Random,
            status: SessionStatus::Playing,
            first: Participant {
                connection: first_connection,
                identity: first_identity,
                side: Side::Light,
            },
            second: Some(Participant {
                connection: second_connection,
                identity: second_identity,
                side: Side::Dark,
            }),
            moves: Vec::new(),
            created_at: Utc::now().fixed_offset(),
        }
    }

    /// An invite-only room: creator alone, waiting for an opponent.
    #[must_use]
    pub fn new_invited(id: String, connection: Uuid, identity: PlayerIdentity) -> Self {
        Self {
            id,
            kind: MatchKind::Invited,
            status: SessionStatus::Waiting,
            first: Participant {
                connection,
                identity,
                side: Side::Light,
            },
            second: None,
            moves: Vec::new(),
            created_at: Utc::now().fixed_offset(),
        }
    }

    /// Fill the second slot and start playing.
    ///
    /// # Errors
    ///
    /// Returns `RoomFull` without touching the session when the second slot
    /// is already occupied.
    pub fn fill_second(
        &mut self,
        connection: Uuid,
        identity: PlayerIdentity,
    ) -> Result<(), JoinError> {
        if self.second.is_some() {
            return Err(JoinError::RoomFull);
        }
        self.second = Some(Participant {
            connection,
            identity,
            side: Side::Dark,
        });
        self.status = SessionStatus::Playing;
        Ok(())
    }

    /// Advance to the terminal state. Callers remove the session from the
    /// store immediately afterwards, so `Finished` is never observable
    /// through a lookup.
    pub fn finish(&mut self) {
        self.status = SessionStatus::Finished;
    }

    /// Append a move to the log, returning its zero-based sequence number.
    pub fn append_move(&mut self, from: String, to: String) -> (usize, DateTime<FixedOffset>) {
        let played_at = Utc::now().fixed_offset();
        self.moves.push(MoveRecord {
            from,
            to,
            played_at,
        });
        (self.moves.len() - 1, played_at)
    }

    /// Iterate the occupied slots, first then second.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        std::iter::once(&self.first).chain(self.second.as_ref())
    }

    /// The occupied slot owned by this connection, if any.
    #[must_use]
    pub fn participant(&self, connection: Uuid) -> Option<&Participant> {
        self.participants().find(|p| p.connection == connection)
    }

    /// Structural outcome of a resignation by `connection`.
    ///
    /// The winner is whichever slot the resigner does not occupy; a caller
    /// that is not a participant is treated as the second slot. The loser is
    /// only known when both slots are filled, so resigning an empty room
    /// yields no ratable loser.
    #[must_use]
    pub fn resign_outcome(&self, connection: Uuid) -> (PlayerIdentity, Option<PlayerIdentity>) {
        match &self.second {
            Some(second) if self.first.connection == connection => {
                (second.identity.clone(), Some(self.first.identity.clone()))
            }
            Some(second) => (self.first.identity.clone(), Some(second.identity.clone())),
            None => (self.first.identity.clone(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(wallet: &str) -> PlayerIdentity {
        PlayerIdentity {
            wallet: wallet.to_string(),
            display_name: wallet.to_string(),
        }
    }

    fn second_side(sess: &Session) -> Option<Side> {
        sess.second.as_ref().map(|p| p.side)
    }

    #[test]
    fn test_random_session_starts_playing_with_both_slots() {
        let sess = Session::new_random(
            "K7PQ2XWM".to_string(),
            Uuid::new_v4(),
            identity("0xaaa"),
            Uuid::new_v4(),
            identity("0xbbb"),
        );
        assert_eq!(sess.status, SessionStatus::Playing);
        assert_eq!(sess.kind, MatchKind::Random);
        assert_eq!(sess.first.side, Side::Light);
        assert_eq!(second_side(&sess), Some(Side::Dark));
    }

    #[test]
    fn test_invited_session_waits_then_plays() {
        let creator = Uuid::new_v4();
        let mut sess = Session::new_invited("K7PQ2XWM".to_string(), creator, identity("0xaaa"));
        assert_eq!(sess.status, SessionStatus::Waiting);
        assert_eq!(sess.kind, MatchKind::Invited);
        assert!(sess.second.is_none());

        assert!(sess.fill_second(Uuid::new_v4(), identity("0xbbb")).is_ok());
        assert_eq!(sess.status, SessionStatus::Playing);
        assert_eq!(second_side(&sess), Some(Side::Dark));
    }

    #[test]
    fn test_status_only_ever_advances() {
        let mut sess = Session::new_invited("K7PQ2XWM".to_string(), Uuid::new_v4(), identity("0xaaa"));
        assert_eq!(sess.status, SessionStatus::Waiting);

        assert!(sess.fill_second(Uuid::new_v4(), identity("0xbbb")).is_ok());
        assert_eq!(sess.status, SessionStatus::Playing);

        // A full room can never drop back to waiting.
        assert!(sess.fill_second(Uuid::new_v4(), identity("0xccc")).is_err());
        assert_eq!(sess.status, SessionStatus::Playing);

        sess.finish();
        assert_eq!(sess.status, SessionStatus::Finished);
    }

    #[test]
    fn test_join_on_full_room_leaves_session_untouched() {
        let mut sess = Session::new_random(
            "K7PQ2XWM".to_string(),
            Uuid::new_v4(),
            identity("0xaaa"),
            Uuid::new_v4(),
            identity("0xbbb"),
        );

        let result = sess.fill_second(Uuid::new_v4(), identity("0xccc"));
        assert_eq!(result, Err(JoinError::RoomFull));
        let second_wallet = sess.second.as_ref().map(|p| p.identity.wallet.as_str());
        assert_eq!(second_wallet, Some("0xbbb"));
        assert_eq!(sess.status, SessionStatus::Playing);
    }

    #[test]
    fn test_move_log_preserves_arrival_order() {
        let mut sess = Session::new_random(
            "K7PQ2XWM".to_string(),
            Uuid::new_v4(),
            identity("0xaaa"),
            Uuid::new_v4(),
            identity("0xbbb"),
        );

        let (seq0, _) = sess.append_move("e2".to_string(), "e4".to_string());
        let (seq1, _) = sess.append_move("e7".to_string(), "e5".to_string());
        assert_eq!((seq0, seq1), (0, 1));
        assert_eq!(sess.moves[0].from, "e2");
        assert_eq!(sess.moves[1].from, "e7");
    }

    #[test]
    fn test_resign_awards_the_other_slot() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let sess = Session::new_random(
            "K7PQ2XWM".to_string(),
            first,
            identity("0xaaa"),
            second,
            identity("0xbbb"),
        );

        let (winner, loser) = sess.resign_outcome(first);
        assert_eq!(winner.wallet, "0xbbb");
        assert_eq!(loser.map(|l| l.wallet).as_deref(), Some("0xaaa"));

        let (winner, loser) = sess.resign_outcome(second);
        assert_eq!(winner.wallet, "0xaaa");
        assert_eq!(loser.map(|l| l.wallet).as_deref(), Some("0xbbb"));
    }

    #[test]
    fn test_resign_in_empty_room_has_no_ratable_loser() {
        let creator = Uuid::new_v4();
        let sess = Session::new_invited("K7PQ2XWM".to_string(), creator, identity("0xaaa"));

        let (winner, loser) = sess.resign_outcome(creator);
        assert_eq!(winner.wallet, "0xaaa");
        assert!(loser.is_none());
    }
}
