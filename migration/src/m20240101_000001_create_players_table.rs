use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Players::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Players::Name).string().not_null())
                    .col(ColumnDef::new(Players::Region).integer().not_null())
                    .col(ColumnDef::new(Players::SteamId).string().null())
                    .col(ColumnDef::new(Players::DiscordId).string().null())
                    .col(
                        ColumnDef::new(Players::LastSignIn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Players::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one player per external id; NULLs do not collide
        manager
            .create_index(
                Index::create()
                    .name("idx_players_steam_id")
                    .table(Players::Table)
                    .col(Players::SteamId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_players_discord_id")
                    .table(Players::Table)
                    .col(Players::DiscordId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Players::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
    Name,
    Region,
    SteamId,
    DiscordId,
    LastSignIn,
    CreatedAt,
}
