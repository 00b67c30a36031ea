use axum::Router;
use std::time::Duration;
use tracing::{info, Level};

mod routes;
mod models;
mod utils;
mod state;

use crate::utils::conf_helper::{init_config_and_bind, get_cached_config, DEFAULT_CONFIG_PATH};
use crate::state::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // === CONFIG + LISTENER ===
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let listener = init_config_and_bind(&config_path).await?;

    let config = get_cached_config();

    info!(
        "Server initialized on {}:{}",
        config.connection.ip,
        config.connection.port
    );

    let state = AppState::new(
        Duration::from_secs(config.fetch_timeout_secs),
        config.custom_dir.clone(),
        config.data_root.clone(),
    )?;

    let app = Router::new()
        .merge(routes::info_routes::health_routes(state.clone()))
        .merge(routes::data_routes::data_routes(state));

    axum::serve(listener, app).await?;

    Ok(())
}
