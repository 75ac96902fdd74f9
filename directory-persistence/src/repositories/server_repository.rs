use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, TransactionTrait,
};
use std::net::IpAddr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{prelude::*, servers};
use crate::locks::KeyedLocks;
use crate::RepositoryError;
use directory_types::{Region, Server};

/// Server registry: game servers keyed by id, unique per (address, game port).
pub struct ServerRepository {
    db: DatabaseConnection,
    create_locks: KeyedLocks,
}

/// Everything a server reports about itself when registering.
#[derive(Debug, Clone)]
pub struct NewServer {
    pub address: IpAddr,
    pub game_port: u16,
    pub status_port: Option<u16>,
    pub region: Region,
    pub hash: u32,
}

impl ServerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            create_locks: KeyedLocks::new(),
        }
    }

    fn model_to_server(model: servers::Model) -> Result<Server, RepositoryError> {
        let invalid = |what: &str| {
            RepositoryError::InvalidRecord(format!("server {} has invalid {}", model.id, what))
        };

        let region = Region::from_code(model.region).ok_or_else(|| invalid("region"))?;
        let game_port = u16::try_from(model.game_port).map_err(|_| invalid("game port"))?;
        let status_port = model
            .status_port
            .map(u16::try_from)
            .transpose()
            .map_err(|_| invalid("status port"))?;
        let hash = u32::try_from(model.hash).map_err(|_| invalid("hash"))?;

        Ok(Server {
            id: model.id,
            address: model.address,
            game_port,
            status_port,
            hash,
            region,
            created_at: model.created_at.to_rfc3339(),
        })
    }

    fn in_selection_order(query: Select<Servers>) -> Select<Servers> {
        query
            .order_by_asc(servers::Column::Address)
            .order_by_asc(servers::Column::GamePort)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Server>, RepositoryError> {
        let server_model = Servers::find_by_id(id).one(&self.db).await?;
        server_model.map(Self::model_to_server).transpose()
    }

    /// Picks a server to hand a client off to.
    ///
    /// There is no latency or load model yet: the first server of the
    /// preferred region wins, falling back to the first server overall.
    /// "First" is by (address, game port), which keeps the choice stable for
    /// a given registry.
    pub async fn find_any(
        &self,
        preferred_region: Option<Region>,
    ) -> Result<Option<Server>, RepositoryError> {
        if let Some(region) = preferred_region {
            let regional = Self::in_selection_order(
                Servers::find().filter(servers::Column::Region.eq(region.code())),
            )
            .one(&self.db)
            .await?;

            if let Some(server_model) = regional {
                return Self::model_to_server(server_model).map(Some);
            }
        }

        let server_model = Self::in_selection_order(Servers::find())
            .one(&self.db)
            .await?;
        server_model.map(Self::model_to_server).transpose()
    }

    /// Registers a server unless its (address, game port) is already taken.
    /// An existing registration is never updated.
    pub async fn create_server(&self, new_server: NewServer) -> Result<Server, RepositoryError> {
        let address = new_server.address.to_string();
        let _guard = self
            .create_locks
            .lock(format!("{}:{}", address, new_server.game_port))
            .await;

        let txn = self.db.begin().await?;

        let existing = Servers::find()
            .filter(servers::Column::Address.eq(address.as_str()))
            .filter(servers::Column::GamePort.eq(i32::from(new_server.game_port)))
            .one(&txn)
            .await?;
        if existing.is_some() {
            warn!(
                "Server already registered at {}:{}",
                address, new_server.game_port
            );
            return Err(RepositoryError::AlreadyExists);
        }

        let server_model = servers::ActiveModel {
            id: sea_orm::ActiveValue::Set(Uuid::new_v4()),
            address: sea_orm::ActiveValue::Set(address),
            game_port: sea_orm::ActiveValue::Set(i32::from(new_server.game_port)),
            status_port: sea_orm::ActiveValue::Set(new_server.status_port.map(i32::from)),
            hash: sea_orm::ActiveValue::Set(i64::from(new_server.hash)),
            region: sea_orm::ActiveValue::Set(new_server.region.code()),
            created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().into()),
        };

        let saved_model = server_model.insert(&txn).await?;
        txn.commit().await?;

        info!(
            "Registered server {} at {}:{}",
            saved_model.id, saved_model.address, saved_model.game_port
        );
        Self::model_to_server(saved_model)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(Servers::find().count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};
    use std::sync::Arc;

    async fn setup_test_db() -> ServerRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        ServerRepository::new(db)
    }

    fn new_server(address: &str, game_port: u16, region: Region) -> NewServer {
        NewServer {
            address: address.parse().unwrap(),
            game_port,
            status_port: Some(game_port + 1),
            region,
            hash: 0xC0FFEE,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_server() {
        let repo = setup_test_db().await;

        let created = repo
            .create_server(new_server("10.0.0.5", 7777, Region::Europe))
            .await
            .unwrap();
        assert_eq!(created.address, "10.0.0.5");
        assert_eq!(created.game_port, 7777);
        assert_eq!(created.status_port, Some(7778));
        assert_eq!(created.hash, 0xC0FFEE);

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);

        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_endpoint_is_rejected() {
        let repo = setup_test_db().await;

        let first = repo
            .create_server(new_server("10.0.0.5", 7777, Region::Europe))
            .await
            .unwrap();

        let duplicate = repo
            .create_server(NewServer {
                hash: 1,
                region: Region::Asia,
                ..new_server("10.0.0.5", 7777, Region::Asia)
            })
            .await;
        assert!(matches!(duplicate, Err(RepositoryError::AlreadyExists)));

        // Same address on another port is a different server
        repo.create_server(new_server("10.0.0.5", 7787, Region::Europe))
            .await
            .unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.find_by_id(first.id).await.unwrap().unwrap(), first);
    }

    #[tokio::test]
    async fn test_find_any_on_empty_registry() {
        let repo = setup_test_db().await;
        assert!(repo.find_any(None).await.unwrap().is_none());
        assert!(repo.find_any(Some(Region::Europe)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_any_prefers_region_then_falls_back() {
        let repo = setup_test_db().await;

        repo.create_server(new_server("10.0.0.9", 7777, Region::NorthAmerica))
            .await
            .unwrap();
        let europe = repo
            .create_server(new_server("10.0.0.7", 7777, Region::Europe))
            .await
            .unwrap();
        let fallback = repo
            .create_server(new_server("10.0.0.1", 7777, Region::NorthAmerica))
            .await
            .unwrap();

        let chosen = repo.find_any(Some(Region::Europe)).await.unwrap().unwrap();
        assert_eq!(chosen.id, europe.id);

        // No Asian servers: global pool, lowest address first
        let chosen = repo.find_any(Some(Region::Asia)).await.unwrap().unwrap();
        assert_eq!(chosen.id, fallback.id);

        let chosen = repo.find_any(None).await.unwrap().unwrap();
        assert_eq!(chosen.id, fallback.id);
    }

    #[tokio::test]
    async fn test_find_any_is_stable() {
        let repo = setup_test_db().await;

        for port in [7790, 7770, 7780] {
            repo.create_server(new_server("10.0.0.3", port, Region::Oceania))
                .await
                .unwrap();
        }

        for _ in 0..3 {
            let chosen = repo.find_any(Some(Region::Oceania)).await.unwrap().unwrap();
            assert_eq!(chosen.game_port, 7770);
        }
    }

    #[tokio::test]
    async fn test_concurrent_registration_of_same_endpoint() {
        let repo = Arc::new(setup_test_db().await);

        let mut handles = Vec::new();
        for _ in 0..6 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.create_server(new_server("192.168.1.20", 27015, Region::SouthAmerica))
                    .await
            }));
        }

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(RepositoryError::AlreadyExists) => {}
                Err(err) => panic!("unexpected error: {}", err),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
