use serde::{Deserialize, Serialize};

/// A gateway instance's own row from the `servers` table (§3, §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: String,
    pub name: String,
    pub port: u16,
    pub base_path: String,
}
