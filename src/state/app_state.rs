use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use wfdb::{Dataset, HttpSource, Result};

#[derive(Clone)]
pub struct SignalInfo {
    pub dataset: Arc<Dataset>,
    pub dataset_id: String,
    pub index: usize, // Position of the signal in the dataset
}

#[derive(Clone)]
pub struct AppState {
    // Maps dataset id -> decoded dataset
    pub datasets: Arc<RwLock<HashMap<String, Arc<Dataset>>>>,
    // Maps unique_name -> SignalInfo
    pub signals: Arc<RwLock<HashMap<String, SignalInfo>>>,
    pub http: HttpSource,
    pub data_root: Option<String>,
}

impl AppState {
    pub fn new(fetch_timeout: Duration, custom_dir: Option<String>, data_root: Option<String>) -> Result<Self> {
        let mut http = HttpSource::new(fetch_timeout)?;
        if let Some(dir) = custom_dir {
            http = http.with_dir(dir);
        }

        Ok(Self {
            datasets: Arc::new(RwLock::new(HashMap::new())),
            signals: Arc::new(RwLock::new(HashMap::new())),
            http,
            data_root,
        })
    }

    /// Stores a dataset under a fresh id and registers its signals.
    /// Returns the id and the registered signal names in signal order.
    pub async fn register_dataset(&self, dataset: Arc<Dataset>) -> (String, Vec<String>) {
        let dataset_id = uuid::Uuid::new_v4().to_string();
        let mut exposed_headers = Vec::new();

        {
            let mut signals = self.signals.write().await;

            for (index, base_name) in dataset.list_signals() {
                let mut final_name = base_name.clone();

                // Signal names are unique across all loaded records
                if signals.contains_key(&final_name) {
                    let mut i = 1;
                    loop {
                        let candidate = format!("{}_{}", base_name, i);
                        if !signals.contains_key(&candidate) {
                            final_name = candidate;
                            break;
                        }
                        i += 1;
                    }
                }

                info!("Register signal: {} (original: {})", final_name, base_name);

                signals.insert(
                    final_name.clone(),
                    SignalInfo {
                        dataset: dataset.clone(),
                        dataset_id: dataset_id.clone(),
                        index,
                    },
                );

                exposed_headers.push(final_name);
            }
        }

        self.datasets
            .write()
            .await
            .insert(dataset_id.clone(), dataset);

        (dataset_id, exposed_headers)
    }

    /// Drops a dataset and every signal registered for it.
    /// Returns `false` when the id is unknown.
    pub async fn unload_dataset(&self, dataset_id: &str) -> bool {
        let removed = self.datasets.write().await.remove(dataset_id);
        let Some(dataset) = removed else {
            return false;
        };

        let mut signals = self.signals.write().await;
        signals.retain(|_, info| info.dataset_id != dataset_id);

        info!(
            "Unloaded record {} ({}), {} signals still registered",
            dataset.header.name,
            dataset_id,
            signals.len()
        );
        true
    }
}
