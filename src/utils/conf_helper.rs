use anyhow::{Context, Result};
use std::sync::OnceLock;
use tokio::fs;
use tokio::net::TcpListener;
use tracing::info;
use crate::models::extension_model::ServerConfig;

pub const DEFAULT_CONFIG_PATH: &str = "wfdb-server.json";

static CONFIG_CACHE: OnceLock<ServerConfig> = OnceLock::new();

pub async fn init_config_and_bind(file_path: &str) -> Result<TcpListener> {
    let data = fs::read_to_string(file_path)
        .await
        .with_context(|| format!("File read error: {file_path}"))?;

    let mut config: ServerConfig =
        serde_json::from_str(&data).context("JSON parse error")?;

    let bind_addr = format!("{}:{}", config.connection.ip, config.connection.port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Bind failed: {bind_addr}"))?;

    let actual_port = listener.local_addr().context("Addr error")?.port();

    // Port 0 in the config means "any free port"
    config.connection.port = actual_port;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| anyhow::anyhow!("Config already initialized"))?;

    info!("Config initialized with dynamic port: {}", actual_port);

    Ok(listener)
}

pub fn get_cached_config() -> &'static ServerConfig {
    CONFIG_CACHE.get().expect("Config not initialized")
}
