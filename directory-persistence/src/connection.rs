use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";
const KEEP_ALIVE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

pub async fn connect_to_database(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    if database_url.starts_with(MEMORY_DATABASE_URL) {
        // Every pooled connection would otherwise get its own empty database,
        // and recycling the single one would drop all data.
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(KEEP_ALIVE)
            .max_lifetime(KEEP_ALIVE);
    }

    Database::connect(options).await
}

pub async fn connect_to_memory_database() -> Result<DatabaseConnection, DbErr> {
    connect_to_database(MEMORY_DATABASE_URL).await
}

pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = connect_to_database(database_url).await?;
    Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied");
    Ok(db)
}
