use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Servers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Servers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Servers::Address).string().not_null())
                    .col(ColumnDef::new(Servers::GamePort).integer().not_null())
                    .col(ColumnDef::new(Servers::StatusPort).integer().null())
                    .col(ColumnDef::new(Servers::Hash).big_integer().not_null())
                    .col(ColumnDef::new(Servers::Region).integer().not_null())
                    .col(
                        ColumnDef::new(Servers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_servers_endpoint")
                    .table(Servers::Table)
                    .col(Servers::Address)
                    .col(Servers::GamePort)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create index on region for server selection
        manager
            .create_index(
                Index::create()
                    .name("idx_servers_region")
                    .table(Servers::Table)
                    .col(Servers::Region)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Servers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Servers {
    Table,
    Id,
    Address,
    GamePort,
    StatusPort,
    Hash,
    Region,
    CreatedAt,
}
