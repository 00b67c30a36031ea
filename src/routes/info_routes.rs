use axum::{
    routing::get,
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    extract::State,
    Json,
};

use tracing::{debug, error};
use serde::Serialize;

use crate::state::app_state::AppState;


pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(info_check))
        .route("/stop", get(stop_process))
        .with_state(state)
}

pub async fn info_check() -> Response {
    let config = crate::utils::conf_helper::get_cached_config();

    debug!("{} requested", config.name);
    Json(config).into_response()
}

async fn health_check(State(state): State<AppState>) -> Response {
    let datasets = state.datasets.read().await.len();

    Json(HealthStatus {
        status: "ok".to_owned(),
        datasets,
    })
    .into_response()
}


async fn stop_process() -> impl IntoResponse {
    error!("Stop endpoint called, shutting down process");

    // Give the response and log lines a moment to flush
    tokio::spawn(async {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        std::process::exit(0);
    });

    StatusCode::OK
}


#[derive(Serialize)]
pub struct HealthStatus {
    status: String,
    datasets: usize,
}
