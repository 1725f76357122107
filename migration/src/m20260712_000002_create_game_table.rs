use sea_orm_migration::prelude::*;

/// Creates the `game` table keyed by the opaque session token.
///
/// Wallet columns carry no foreign keys: durable writes from the relay core are
/// fire-and-forget and unordered relative to each other, so a game record may
/// land before the player rows it references.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Game {
    Table,
    Id,
    LightWallet,
    DarkWallet,
    Kind,
    Status,
    Winner,
    CreatedAt,
    FinishedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Game::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Game::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Game::LightWallet)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Game::DarkWallet).string_len(128).not_null())
                    .col(ColumnDef::new(Game::Kind).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Game::Status)
                            .string_len(20)
                            .not_null()
                            .default("playing"),
                    )
                    .col(ColumnDef::new(Game::Winner).string_len(128).null())
                    .col(
                        ColumnDef::new(Game::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Game::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Game-history queries filter by either wallet column
        manager
            .create_index(
                Index::create()
                    .name("idx_game_light_wallet")
                    .table(Game::Table)
                    .col(Game::LightWallet)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_dark_wallet")
                    .table(Game::Table)
                    .col(Game::DarkWallet)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Game::Table).to_owned())
            .await
    }
}
