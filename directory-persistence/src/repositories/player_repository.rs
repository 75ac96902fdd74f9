use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{players, prelude::*};
use crate::locks::KeyedLocks;
use crate::RepositoryError;
use directory_types::{ExternalIds, Player, Region};

/// Identity store: player records keyed by id and indexed by external ids.
pub struct PlayerRepository {
    db: DatabaseConnection,
    create_locks: KeyedLocks,
}

impl PlayerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            create_locks: KeyedLocks::new(),
        }
    }

    fn model_to_player(model: players::Model) -> Result<Player, RepositoryError> {
        let region = Region::from_code(model.region).ok_or_else(|| {
            RepositoryError::InvalidRecord(format!(
                "player {} has unknown region code {}",
                model.id, model.region
            ))
        })?;

        Ok(Player {
            id: model.id,
            name: model.name,
            region,
            steam_id: model.steam_id,
            discord_id: model.discord_id,
            last_sign_in: model.last_sign_in.map(|at| at.to_rfc3339()),
            created_at: model.created_at.to_rfc3339(),
        })
    }

    async fn query_by_external_ids<C: ConnectionTrait>(
        conn: &C,
        external_ids: &ExternalIds,
    ) -> Result<Option<players::Model>, DbErr> {
        if external_ids.is_empty() {
            return Ok(None);
        }

        let mut condition = Condition::any();
        if let Some(steam_id) = &external_ids.steam_id {
            condition = condition.add(players::Column::SteamId.eq(steam_id.as_str()));
        }
        if let Some(discord_id) = &external_ids.discord_id {
            condition = condition.add(players::Column::DiscordId.eq(discord_id.as_str()));
        }

        Players::find()
            .filter(condition)
            .order_by_asc(players::Column::CreatedAt)
            .one(conn)
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Player>, RepositoryError> {
        let player_model = Players::find_by_id(id).one(&self.db).await?;
        player_model.map(Self::model_to_player).transpose()
    }

    /// Matches a player whose Steam id or Discord id equals the supplied one.
    /// With no ids supplied nothing matches.
    pub async fn find_by_external_ids(
        &self,
        external_ids: &ExternalIds,
    ) -> Result<Option<Player>, RepositoryError> {
        let player_model = Self::query_by_external_ids(&self.db, external_ids).await?;
        player_model.map(Self::model_to_player).transpose()
    }

    /// Creates a player unless one of its external ids is already bound.
    ///
    /// Existing players are never updated or merged. Creates sharing an
    /// external id are serialized, and the lookup and insert run in one
    /// transaction so a failed create leaves nothing behind.
    pub async fn create_player(
        &self,
        name: &str,
        region: Region,
        external_ids: &ExternalIds,
        explicit_id: Option<Uuid>,
    ) -> Result<Player, RepositoryError> {
        let mut lock_keys = external_ids.keys();
        if let Some(id) = explicit_id {
            lock_keys.push(format!("player:{}", id));
        }
        let _guard = self.create_locks.lock_all(lock_keys).await;

        let txn = self.db.begin().await?;

        if Self::query_by_external_ids(&txn, external_ids)
            .await?
            .is_some()
        {
            warn!(
                "Player already exists with external ids steam={:?} discord={:?}",
                external_ids.steam_id, external_ids.discord_id
            );
            return Err(RepositoryError::AlreadyExists);
        }

        // Generated once and used for the player indefinitely
        let player_id = match explicit_id {
            Some(id) => {
                if Players::find_by_id(id).one(&txn).await?.is_some() {
                    warn!("Player id {} is already taken", id);
                    return Err(RepositoryError::AlreadyExists);
                }
                id
            }
            None => Uuid::new_v4(),
        };

        let player_model = players::ActiveModel {
            id: sea_orm::ActiveValue::Set(player_id),
            name: sea_orm::ActiveValue::Set(name.to_string()),
            region: sea_orm::ActiveValue::Set(region.code()),
            steam_id: sea_orm::ActiveValue::Set(external_ids.steam_id.clone()),
            discord_id: sea_orm::ActiveValue::Set(external_ids.discord_id.clone()),
            last_sign_in: sea_orm::ActiveValue::Set(None),
            created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().into()),
        };

        let saved_model = player_model.insert(&txn).await?;
        txn.commit().await?;

        info!("Created player {} ({})", saved_model.id, saved_model.name);
        Self::model_to_player(saved_model)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(Players::find().count(&self.db).await?)
    }
}
