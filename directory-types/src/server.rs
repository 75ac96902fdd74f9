use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::Region;

/// A joinable game-server instance as registered in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Server {
    pub id: Uuid,
    pub address: String,
    pub game_port: u16,
    pub status_port: Option<u16>,
    pub hash: u32,
    pub region: Region,
    pub created_at: String, // ISO 8601 string
}

impl Server {
    pub fn endpoint(&self) -> String {
        if self.address.contains(':') {
            format!("[{}]:{}", self.address, self.game_port)
        } else {
            format!("{}:{}", self.address, self.game_port)
        }
    }
}
