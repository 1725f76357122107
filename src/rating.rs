//! Rating policy applied when a game concludes.
//!
//! Deltas are independent per-player increments, not a zero-sum exchange: a
//! normal loss costs less than the winner gains, and a resignation costs more.

/// Rating points awarded to the winner of any concluded game.
pub const WIN_DELTA: i32 = 25;

/// Rating points taken from the loser of a normally concluded game.
pub const LOSS_DELTA: i32 = -15;

/// Rating points taken from a player who resigns.
pub const RESIGN_DELTA: i32 = -20;

/// Rating players start from before their first rated game.
pub const INITIAL_RATING: i32 = 1200;

/// A single player's stat adjustment for one concluded game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsDelta {
    pub rating: i32,
    pub wins: i32,
    pub losses: i32,
    pub games_played: i32,
}

impl StatsDelta {
    /// Adjustment for the winning side of any concluded game.
    #[must_use]
    pub const fn win() -> Self {
        Self {
            rating: WIN_DELTA,
            wins: 1,
            losses: 0,
            games_played: 1,
        }
    }

    /// Adjustment for the losing side of a normally concluded game.
    #[must_use]
    pub const fn loss() -> Self {
        Self {
            rating: LOSS_DELTA,
            wins: 0,
            losses: 1,
            games_played: 1,
        }
    }

    /// Adjustment for a player who resigned.
    #[must_use]
    pub const fn resignation() -> Self {
        Self {
            rating: RESIGN_DELTA,
            wins: 0,
            losses: 1,
            games_played: 1,
        }
    }
}
