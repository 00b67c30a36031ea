use axum::{
    routing::{delete, get, post},
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
    extract::{
        Path,
        State,
        ws::WebSocketUpgrade,
    },
};

use std::sync::Arc;

use tracing::{debug, error};
use serde::{Serialize, Deserialize};

use crate::routes::ws_handler::handle_ws_fetch;
use crate::state::app_state::AppState;
use wfdb::{Dataset, FileSource, WfdbReader};

#[derive(Serialize)]
pub struct ReaderSummary {
    pub id: String,
    pub name: String,
    pub signals_count: usize,
    pub headers: Vec<String>,
}

/// Response for GET /readers/{id}/headers
#[derive(Serialize)]
pub struct ReaderHeaders {
    pub id: String,
    pub headers: Vec<String>,
}

#[derive(Serialize)]
pub struct AnnotationView {
    pub t: i64,
    pub seconds: f64,
    pub code: u8,
    pub symbol: &'static str,
    pub description: &'static str,
    pub aux: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct FileReadRequest {
    /// URL or path of a `.hea` header
    pub path: String,
    /// Overrides the configured `?dir=` query for HTTP requests
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct FileReadResponse {
    pub id: String,
    pub name: String,
    pub path: String,
    pub headers: Vec<String>,
    pub notes: Option<String>,
    pub sampling_frequency: f64,
    pub num_samples: usize,
    pub annotations: usize,
}


/// =======================
/// ROUTER
/// =======================

pub fn data_routes(state: AppState) -> Router {
    Router::new()
        .route("/read-file", post(read_file))
        .route("/fetch/{signal}", get(ws_fetch))
        .route("/readers", get(list_readers))
        .route("/readers/{id}", delete(unload_reader))
        .route("/readers/{id}/headers", get(reader_headers))
        .route("/readers/{id}/annotations", get(reader_annotations))
        .with_state(state)
}

fn is_http(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

async fn load_dataset(state: &AppState, request: &FileReadRequest) -> Option<Dataset> {
    if is_http(&request.path) {
        let mut source = state.http.clone();
        if let Some(dir) = &request.dir {
            source = source.with_dir(dir.clone());
        }
        WfdbReader::new(source).load(&request.path).await
    } else {
        let source = match &state.data_root {
            Some(root) => FileSource::with_root(root),
            None => FileSource::new(),
        };
        WfdbReader::new(source).load(&request.path).await
    }
}


/// =======================
/// HANDLERS
/// =======================

async fn read_file(
    State(state): State<AppState>,
    Json(request): Json<FileReadRequest>,
) -> Response {
    debug!("Reading record: path={}", request.path);

    let dataset = match load_dataset(&state, &request).await {
        Some(ds) => Arc::new(ds),
        None => {
            error!("Failed to load record {}", request.path);
            return StatusCode::UNPROCESSABLE_ENTITY.into_response();
        }
    };

    let (dataset_id, exposed_headers) = state.register_dataset(dataset.clone()).await;

    Json(FileReadResponse {
        id: dataset_id,
        name: dataset.header.name.clone(),
        path: request.path,
        headers: exposed_headers,
        notes: dataset.header.notes.clone(),
        sampling_frequency: dataset.sampling_frequency(),
        num_samples: dataset.num_samples(),
        annotations: dataset.annotations.len(),
    })
    .into_response()
}


async fn ws_fetch(
    State(state): State<AppState>,
    Path(signal_name): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let signal_info = {
        let signals = state.signals.read().await;
        signals.get(&signal_name).cloned()
    };

    let signal_info = match signal_info {
        Some(info) => info,
        None => {
            error!("Signal not found: {}", signal_name);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_ws_fetch(socket, signal_info, signal_name))
}

/// Registered names of the signals belonging to one dataset.
async fn registered_names(state: &AppState, dataset_id: &str) -> Vec<String> {
    let signals = state.signals.read().await;
    let mut names: Vec<(usize, String)> = signals
        .iter()
        .filter(|(_, info)| info.dataset_id == dataset_id)
        .map(|(name, info)| (info.index, name.clone()))
        .collect();
    names.sort();
    names.into_iter().map(|(_, name)| name).collect()
}

async fn list_readers(
    State(state): State<AppState>,
) -> impl IntoResponse {
    let datasets: Vec<(String, String)> = {
        let datasets = state.datasets.read().await;
        datasets
            .iter()
            .map(|(id, ds)| (id.clone(), ds.header.name.clone()))
            .collect()
    };

    let mut out: Vec<ReaderSummary> = Vec::with_capacity(datasets.len());
    for (id, name) in datasets {
        let headers = registered_names(&state, &id).await;
        out.push(ReaderSummary {
            id,
            name,
            signals_count: headers.len(),
            headers,
        });
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));

    Json(out)
}

async fn unload_reader(
    State(state): State<AppState>,
    Path(reader_id): Path<String>,
) -> StatusCode {
    if state.unload_dataset(&reader_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn reader_headers(
    State(state): State<AppState>,
    Path(reader_id): Path<String>,
) -> impl IntoResponse {
    if !state.datasets.read().await.contains_key(&reader_id) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let headers = registered_names(&state, &reader_id).await;

    Json(ReaderHeaders {
        id: reader_id,
        headers,
    }).into_response()
}

async fn reader_annotations(
    State(state): State<AppState>,
    Path(reader_id): Path<String>,
) -> impl IntoResponse {
    let dataset = match state.datasets.read().await.get(&reader_id) {
        Some(ds) => ds.clone(),
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    let fs = dataset.sampling_frequency();
    let out: Vec<AnnotationView> = dataset
        .annotations
        .iter()
        .map(|a| AnnotationView {
            t: a.t,
            seconds: a.t as f64 / fs,
            code: a.code,
            symbol: a.symbol(),
            description: a.info().map(|c| c.description).unwrap_or("?"),
            aux: a.aux.clone(),
        })
        .collect();

    Json(out).into_response()
}
