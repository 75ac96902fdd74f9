use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{ExternalIds, Region, ResultCode, Server};

// Requests

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct SignInRequest {
    /// Kept as a string: the UUID shape check is a coordinator rule.
    pub player_id: String,
    pub version: String,
    pub hash: u32,
    pub joining_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct SignOutRequest {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct CreatePlayerRequest {
    pub name: String,
    pub region: Region,
    pub steam_id: Option<String>,
    pub discord_id: Option<String>,
    /// Only honoured by registry-authoritative deployments.
    pub player_id: Option<Uuid>,
}

impl CreatePlayerRequest {
    pub fn external_ids(&self) -> ExternalIds {
        ExternalIds::new(self.steam_id.clone(), self.discord_id.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct ResolvePlayerIdsRequest {
    pub external_ids: Vec<ExternalIds>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct CheckInRequest {
    pub game_port: u16,
    pub status_port: Option<u16>,
    pub region: Region,
    pub hash: u32,
    /// Present when the server is re-confirming an earlier registration.
    pub server_id: Option<Uuid>,
}

// Responses. Every response carries `result`; other fields only on success.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusResponse {
    #[ts(type = "number")]
    pub result: ResultCode,
}

impl StatusResponse {
    pub fn new(result: ResultCode) -> Self {
        Self { result }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignInResponse {
    #[ts(type = "number")]
    pub result: ResultCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sign_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,
}

impl SignInResponse {
    pub fn success(last_sign_in: Option<String>, server: Server) -> Self {
        Self {
            result: ResultCode::Success,
            last_sign_in,
            server: Some(server),
        }
    }

    pub fn failure(result: ResultCode) -> Self {
        Self {
            result,
            last_sign_in: None,
            server: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreatePlayerResponse {
    #[ts(type = "number")]
    pub result: ResultCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResolvePlayerIdsResponse {
    #[ts(type = "number")]
    pub result: ResultCode,
    /// One entry per requested pair, in request order; `null` when unresolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_ids: Option<Vec<Option<Uuid>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckInResponse {
    #[ts(type = "number")]
    pub result: ResultCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<Uuid>,
}
