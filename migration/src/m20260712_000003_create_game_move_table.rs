use sea_orm_migration::prelude::*;

/// Creates the `game_move` table holding the append-only move log per game.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum GameMove {
    Table,
    Id,
    GameId,
    Seq,
    MoveFrom,
    MoveTo,
    PlayedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameMove::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameMove::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameMove::GameId).string_len(32).not_null())
                    .col(ColumnDef::new(GameMove::Seq).integer().not_null())
                    .col(ColumnDef::new(GameMove::MoveFrom).string_len(32).not_null())
                    .col(ColumnDef::new(GameMove::MoveTo).string_len(32).not_null())
                    .col(
                        ColumnDef::new(GameMove::PlayedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (game, move index); also serves replay-in-order reads
        manager
            .create_index(
                Index::create()
                    .name("idx_game_move_game_id_seq")
                    .table(GameMove::Table)
                    .col(GameMove::GameId)
                    .col(GameMove::Seq)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameMove::Table).to_owned())
            .await
    }
}
