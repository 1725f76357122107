use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game")]
pub struct Model {
    /// The opaque session token the game was played under.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub light_wallet: String,
    pub dark_wallet: String,
    /// `random` (queue-matched) or `invited` (room code).
    pub kind: String,
    /// `playing`, `finished`, or `abandoned`.
    pub status: String,
    pub winner: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub finished_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
