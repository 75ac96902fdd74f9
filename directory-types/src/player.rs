use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::Region;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub region: Region,
    pub steam_id: Option<String>,
    pub discord_id: Option<String>,
    pub last_sign_in: Option<String>, // ISO 8601 string
    pub created_at: String,
}

/// Third-party platform identifiers a player can be resolved by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct ExternalIds {
    pub steam_id: Option<String>,
    pub discord_id: Option<String>,
}

impl ExternalIds {
    pub fn new(steam_id: Option<String>, discord_id: Option<String>) -> Self {
        Self {
            steam_id,
            discord_id,
        }
    }

    pub fn steam(steam_id: impl Into<String>) -> Self {
        Self::new(Some(steam_id.into()), None)
    }

    pub fn discord(discord_id: impl Into<String>) -> Self {
        Self::new(None, Some(discord_id.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.steam_id.is_none() && self.discord_id.is_none()
    }

    /// Namespaced keys, one per supplied id, e.g. `steam:7656...`.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(steam_id) = &self.steam_id {
            keys.push(format!("steam:{}", steam_id));
        }
        if let Some(discord_id) = &self.discord_id {
            keys.push(format!("discord:{}", discord_id));
        }
        keys
    }
}
