use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "player")]
pub struct Model {
    /// Caller-supplied wallet address; the durable key for a player.
    #[sea_orm(primary_key, auto_increment = false)]
    pub wallet: String,
    pub display_name: String,
    pub rating: i32,
    pub wins: i32,
    pub losses: i32,
    pub games_played: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
