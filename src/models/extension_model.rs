use serde::{Deserialize, Serialize};

fn default_fetch_timeout() -> u64 {
    30
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Root directory for records requested by path
    #[serde(default)]
    pub data_root: Option<String>,
    /// Value of the `?dir=` query appended to HTTP record requests
    #[serde(default)]
    pub custom_dir: Option<String>,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    pub connection: Connection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Connection {
    pub ip: String,
    pub port: u16,
}
