use directory_core::SessionTracker;
use directory_persistence::connection::connect_to_memory_database;
use directory_persistence::repositories::{PlayerRepository, ServerRepository};
use directory_server::config::Config;
use directory_server::coordinator::{DirectoryCoordinator, SignInGrant};
use directory_server::error::DirectoryError;
use directory_types::{ExternalIds, Region};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

/// Test setup that provides a coordinator over a fresh in-memory store
pub struct TestDirectorySetup {
    pub db: DatabaseConnection,
    pub players: Arc<PlayerRepository>,
    pub servers: Arc<ServerRepository>,
    pub sessions: Arc<SessionTracker>,
    pub coordinator: Arc<DirectoryCoordinator>,
}

impl TestDirectorySetup {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        Self::build(config, |coordinator| coordinator).await
    }

    /// Lets a test customize the coordinator, e.g. to plug in a version policy
    pub async fn build(
        config: Config,
        customize: impl FnOnce(DirectoryCoordinator) -> DirectoryCoordinator,
    ) -> Self {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let players = Arc::new(PlayerRepository::new(db.clone()));
        let servers = Arc::new(ServerRepository::new(db.clone()));
        let sessions = Arc::new(SessionTracker::new());
        let coordinator = customize(DirectoryCoordinator::new(
            players.clone(),
            servers.clone(),
            sessions.clone(),
            &config,
        ));

        Self {
            db,
            players,
            servers,
            sessions,
            coordinator: Arc::new(coordinator),
        }
    }

    /// Creates a player bound to the given Steam id
    pub async fn create_steam_player(&self, name: &str, steam_id: &str, region: Region) -> Uuid {
        self.coordinator
            .create_player(name, region, &ExternalIds::steam(steam_id), None)
            .await
            .unwrap()
    }

    /// Registers a server as if it checked in from `address`
    pub async fn register_server(&self, address: &str, game_port: u16, region: Region) -> Uuid {
        self.coordinator
            .check_in_server(address, game_port, Some(game_port + 1), region, 42, None)
            .await
            .unwrap()
    }

    pub async fn sign_in(&self, player_id: Uuid) -> Result<SignInGrant, DirectoryError> {
        self.coordinator
            .sign_in(&player_id.to_string(), "1.0.0", 42, None)
            .await
    }
}
