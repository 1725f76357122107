//! Durable player and game records.
//!
//! Writes triggered by live play are fire-and-forget: handlers spawn them and
//! keep relaying without waiting for the row to land. A write can therefore
//! arrive after its session was retired, or for a game that was never
//! recorded (an invite room nobody joined) — those cases are skipped quietly
//! instead of failing.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entities::{game, game_move, player};
use crate::hub::{PairedMatch, RecordedMove};
use crate::protocol::PlayerIdentity;
use crate::rating::{INITIAL_RATING, StatsDelta};

/// Game record status once both participants are known.
pub const GAME_STATUS_PLAYING: &str = "playing";
/// Game record status after a reported outcome or resignation.
pub const GAME_STATUS_FINISHED: &str = "finished";
/// Game record status after a participant dropped mid-game.
pub const GAME_STATUS_ABANDONED: &str = "abandoned";

/// All durable reads and writes behind the real-time core and the REST
/// lookups.
#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    db: DatabaseConnection,
}

impl PersistenceGateway {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a player row for this wallet, or refresh its display name.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying write fails.
    pub async fn upsert_user(&self, identity: &PlayerIdentity) -> Result<(), DbErr> {
        let now = Utc::now().fixed_offset();

        if let Some(existing) = player::Entity::find_by_id(&identity.wallet)
            .one(&self.db)
            .await?
        {
            if existing.display_name != identity.display_name {
                let mut active: player::ActiveModel = existing.into();
                active.display_name = Set(identity.display_name.clone());
                active.updated_at = Set(now);
                active.update(&self.db).await?;
            }
            return Ok(());
        }

        player::ActiveModel {
            wallet: Set(identity.wallet.clone()),
            display_name: Set(identity.display_name.clone()),
            rating: Set(INITIAL_RATING),
            wins: Set(0),
            losses: Set(0),
            games_played: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// Apply one game's stat adjustment to a player. Unknown wallets are
    /// skipped: outcomes may name identities that never registered.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying write fails.
    pub async fn increment_user_stats(&self, wallet: &str, delta: StatsDelta) -> Result<(), DbErr> {
        let Some(existing) = player::Entity::find_by_id(wallet).one(&self.db).await? else {
            tracing::debug!(wallet, "stat update for unknown player skipped");
            return Ok(());
        };

        let mut active: player::ActiveModel = existing.clone().into();
        active.rating = Set(existing.rating + delta.rating);
        active.wins = Set(existing.wins + delta.wins);
        active.losses = Set(existing.losses + delta.losses);
        active.games_played = Set(existing.games_played + delta.games_played);
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(&self.db).await?;
        Ok(())
    }

    /// Record a freshly paired game in `playing` status.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying write fails.
    pub async fn create_game_record(&self, paired: &PairedMatch) -> Result<(), DbErr> {
        game::ActiveModel {
            id: Set(paired.session_id.clone()),
            light_wallet: Set(paired.light.wallet.clone()),
            dark_wallet: Set(paired.dark.wallet.clone()),
            kind: Set(paired.kind.as_str().to_string()),
            status: Set(GAME_STATUS_PLAYING.to_string()),
            winner: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
            finished_at: Set(None),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// Append one move to a game's history.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying write fails.
    pub async fn append_move(&self, recorded: &RecordedMove) -> Result<(), DbErr> {
        game_move::ActiveModel {
            id: Set(Uuid::new_v4()),
            game_id: Set(recorded.session_id.clone()),
            seq: Set(i32::try_from(recorded.seq).unwrap_or(i32::MAX)),
            move_from: Set(recorded.from.clone()),
            move_to: Set(recorded.to.clone()),
            played_at: Set(recorded.played_at),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// Mark a game as concluded. A missing row (never recorded, or the
    /// record write is still in flight) is skipped quietly.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying write fails.
    pub async fn finish_game(
        &self,
        session_id: &str,
        status: &str,
        winner: Option<&str>,
        finished_at: DateTime<FixedOffset>,
    ) -> Result<(), DbErr> {
        let Some(existing) = game::Entity::find_by_id(session_id).one(&self.db).await? else {
            tracing::debug!(session_id, "finish for unrecorded game skipped");
            return Ok(());
        };

        let mut active: game::ActiveModel = existing.into();
        active.status = Set(status.to_string());
        active.winner = Set(winner.map(ToString::to_string));
        active.finished_at = Set(Some(finished_at));
        active.update(&self.db).await?;
        Ok(())
    }

    /// Look up one player by wallet.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying query fails.
    pub async fn find_player(&self, wallet: &str) -> Result<Option<player::Model>, DbErr> {
        player::Entity::find_by_id(wallet).one(&self.db).await
    }

    /// The top players by rating.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying query fails.
    pub async fn query_leaderboard(&self, limit: u64) -> Result<Vec<player::Model>, DbErr> {
        player::Entity::find()
            .order_by_desc(player::Column::Rating)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// A player's most recent games on either side of the board.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying query fails.
    pub async fn query_user_games(&self, wallet: &str, limit: u64) -> Result<Vec<game::Model>, DbErr> {
        game::Entity::find()
            .filter(
                Condition::any()
                    .add(game::Column::LightWallet.eq(wallet))
                    .add(game::Column::DarkWallet.eq(wallet)),
            )
            .order_by_desc(game::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }
}
