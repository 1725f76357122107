//! FIFO waiting list for random matchmaking.

use std::collections::VecDeque;

use uuid::Uuid;

use crate::protocol::PlayerIdentity;

/// One connection waiting for a random opponent.
#[derive(Debug, Clone)]
pub struct WaitingEntry {
    pub connection: Uuid,
    pub identity: PlayerIdentity,
}

/// Ordered waiting list. Strict FIFO: the longest-waiting entry is always
/// matched next.
#[derive(Debug, Default)]
pub struct MatchQueue {
    entries: VecDeque<WaitingEntry>,
}

impl MatchQueue {
    /// Drop any entry held by this wallet or this connection.
    ///
    /// Called before queueing or pairing so a re-requesting player replaces
    /// its stale entry instead of appearing twice, and so a connection can
    /// never be paired against itself.
    pub fn remove_stale(&mut self, connection: Uuid, wallet: &str) {
        self.entries
            .retain(|entry| entry.connection != connection && entry.identity.wallet != wallet);
    }

    /// Pop the longest-waiting entry, if any.
    pub fn pop_front(&mut self) -> Option<WaitingEntry> {
        self.entries.pop_front()
    }

    /// Append a fresh entry at the tail.
    pub fn push_back(&mut self, entry: WaitingEntry) {
        self.entries.push_back(entry);
    }

    /// Remove the entry owned by this connection. No-op when the connection
    /// is not queued (it may already have been paired).
    pub fn remove_connection(&mut self, connection: Uuid) {
        self.entries.retain(|entry| entry.connection != connection);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
