use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::state::app_state::SignalInfo;

#[derive(Serialize)]
struct SignalPayload {
    timestamp: f64,
    value: f64,
    desc: String,
    seq: u64,
    end_flag: bool,
}

/// Streams every sample of one signal, then an end frame. Samples that
/// carry an annotation get its symbol (and aux text) in `desc`.
pub async fn handle_ws_fetch(mut socket: WebSocket, signal: SignalInfo, signal_name: String) {
    info!("ws_fetch streaming started: {}", signal_name);

    let dataset = &signal.dataset;
    let values = match dataset.signals.get(signal.index) {
        Some(values) => values,
        None => {
            error!("signal index {} missing from dataset {}", signal.index, signal.dataset_id);
            return;
        }
    };

    let fs = dataset.sampling_frequency();
    let mut annotations = dataset.annotations.iter().peekable();
    let mut seq: u64 = 0;

    for (i, value) in values.iter().enumerate() {
        let t = i as i64;

        let mut desc = String::new();
        while let Some(annot) = annotations.next_if(|a| a.t <= t) {
            if annot.t == t {
                desc.push_str(annot.symbol());
                if let Some(aux) = &annot.aux {
                    desc.push_str(aux);
                }
            }
        }

        let payload = SignalPayload {
            timestamp: i as f64 / fs,
            value: *value,
            desc,
            seq,
            end_flag: false,
        };

        let json = match serde_json::to_string(&payload) {
            Ok(j) => j,
            Err(e) => {
                error!("json serialize error: {}", e);
                return;
            }
        };

        if let Err(e) = socket.send(Message::Text(json.into())).await {
            warn!("ws send failed: {}", e);
            return;
        }

        seq += 1;
    }

    let end_payload = SignalPayload {
        timestamp: 0.0,
        value: 0.0,
        desc: String::new(),
        seq,
        end_flag: true,
    };

    if let Ok(json) = serde_json::to_string(&end_payload) {
        let _ = socket.send(Message::Text(json.into())).await;
    }

    info!("ws_fetch finished: {} ({} samples)", signal_name, seq);
}
