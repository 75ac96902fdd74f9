use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::DirectoryError;
use directory_core::{
    AcceptAnyVersion, SessionTracker, VersionValidator, parse_caller_address, parse_player_id,
};
use directory_persistence::RepositoryError;
use directory_persistence::repositories::{NewServer, PlayerRepository, ServerRepository};
use directory_types::{ExternalIds, Region, Server};

/// What a successful sign-in hands back to the client.
#[derive(Debug, Clone)]
pub struct SignInGrant {
    pub last_sign_in: Option<String>,
    pub server: Server,
}

/// Outcome of resolving a batch of external ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Positionally aligned with the request; `None` marks an unresolved pair.
    pub player_ids: Vec<Option<Uuid>>,
}

impl Resolution {
    pub fn any_resolved(&self) -> bool {
        self.player_ids.iter().any(Option::is_some)
    }
}

/// Composes the identity store, server registry and session tracker into
/// the directory's operations. Records are only created or read here, never
/// modified.
pub struct DirectoryCoordinator {
    players: Arc<PlayerRepository>,
    servers: Arc<ServerRepository>,
    sessions: Arc<SessionTracker>,
    version_validator: Arc<dyn VersionValidator>,
    store_timeout: Duration,
    authoritative_player_ids: bool,
}

impl DirectoryCoordinator {
    pub fn new(
        players: Arc<PlayerRepository>,
        servers: Arc<ServerRepository>,
        sessions: Arc<SessionTracker>,
        config: &Config,
    ) -> Self {
        Self {
            players,
            servers,
            sessions,
            version_validator: Arc::new(AcceptAnyVersion),
            store_timeout: config.store_timeout,
            authoritative_player_ids: config.authoritative_player_ids,
        }
    }

    pub fn with_version_validator(mut self, validator: impl VersionValidator + 'static) -> Self {
        self.version_validator = Arc::new(validator);
        self
    }

    /// Runs one store call with the configured deadline and folds its
    /// failure into a coordinator outcome.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, DirectoryError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(RepositoryError::AlreadyExists)) => Err(DirectoryError::AccountAlreadyExists),
            Ok(Err(err)) => {
                error!("Store failure during {}: {}", operation, err);
                Err(DirectoryError::Store(err))
            }
            Err(_) => {
                error!(
                    "Store call {} timed out after {:?}",
                    operation, self.store_timeout
                );
                Err(DirectoryError::StoreTimeout(self.store_timeout))
            }
        }
    }

    pub async fn sign_in(
        &self,
        player_id: &str,
        version: &str,
        hash: u32,
        joining_id: Option<Uuid>,
    ) -> Result<SignInGrant, DirectoryError> {
        let player_id = parse_player_id(player_id)?;
        self.version_validator.validate(version, hash)?;

        let player = self
            .bounded("find player", self.players.find_by_id(player_id))
            .await?
            .ok_or(DirectoryError::AccountNotFound)?;

        // Released again on every early return below
        let reservation = self.sessions.try_begin_session(player_id).map_err(|err| {
            warn!("Rejected sign-in for {}: already signed in", player_id);
            DirectoryError::from(err)
        })?;

        let server = match joining_id {
            Some(server_id) => {
                self.bounded("find joining server", self.servers.find_by_id(server_id))
                    .await?
            }
            None => {
                self.bounded("select server", self.servers.find_any(Some(player.region)))
                    .await?
            }
        }
        .ok_or_else(|| {
            warn!("No server available for player {}", player_id);
            DirectoryError::ServerNotFound
        })?;

        if !reservation.commit() {
            warn!("Player {} signed out while signing in", player_id);
        }

        info!(
            "Player {} signed in, handed off to server {} ({})",
            player_id,
            server.id,
            server.endpoint()
        );

        Ok(SignInGrant {
            last_sign_in: player.last_sign_in,
            server,
        })
    }

    /// Ends the player's session. Signing out twice is not an error.
    pub async fn sign_out(&self, player_id: &str) -> Result<(), DirectoryError> {
        let player_id = parse_player_id(player_id)?;
        let duration = self.sessions.active_duration(player_id);
        if self.sessions.end_session(player_id) {
            match duration {
                Some(duration) => info!("Player {} signed out after {:?}", player_id, duration),
                None => info!("Player {} signed out", player_id),
            }
        }
        Ok(())
    }

    pub async fn create_player(
        &self,
        name: &str,
        region: Region,
        external_ids: &ExternalIds,
        explicit_id: Option<Uuid>,
    ) -> Result<Uuid, DirectoryError> {
        if external_ids.is_empty() {
            return Err(DirectoryError::RequestInvalid(
                "at least one external id is required".to_string(),
            ));
        }

        if explicit_id.is_some() && !self.authoritative_player_ids {
            return Err(DirectoryError::RequestInvalid(
                "player ids are assigned by the directory".to_string(),
            ));
        }

        let player = self
            .bounded(
                "create player",
                self.players
                    .create_player(name, region, external_ids, explicit_id),
            )
            .await?;

        Ok(player.id)
    }

    /// Resolves each pair on its own; the output keeps the input order.
    /// Finding nobody is still a resolution, see [`Resolution::any_resolved`].
    pub async fn resolve_player_ids(
        &self,
        external_ids: &[ExternalIds],
    ) -> Result<Resolution, DirectoryError> {
        let mut player_ids = Vec::with_capacity(external_ids.len());

        for ids in external_ids {
            let player = self
                .bounded("resolve player", self.players.find_by_external_ids(ids))
                .await?;
            player_ids.push(player.map(|player| player.id));
        }

        Ok(Resolution { player_ids })
    }

    /// Registers a server, or re-confirms an earlier registration when the
    /// server already knows its id.
    pub async fn check_in_server(
        &self,
        caller_address: &str,
        game_port: u16,
        status_port: Option<u16>,
        region: Region,
        hash: u32,
        existing_server_id: Option<Uuid>,
    ) -> Result<Uuid, DirectoryError> {
        if let Some(server_id) = existing_server_id {
            let server = self
                .bounded("confirm server", self.servers.find_by_id(server_id))
                .await?
                .ok_or_else(|| {
                    warn!("Check-in for unknown server {}", server_id);
                    DirectoryError::ServerNotFound
                })?;
            return Ok(server.id);
        }

        let address = parse_caller_address(caller_address)?;

        let server = self
            .bounded(
                "register server",
                self.servers.create_server(NewServer {
                    address,
                    game_port,
                    status_port,
                    region,
                    hash,
                }),
            )
            .await?;

        Ok(server.id)
    }
}
