// Dataset assembly: fetch header, samples and annotations, then decode

use crate::core::annotation::decode_annotations;
use crate::core::calibrate::scale_signals;
use crate::core::codec::{decode_samples, resolve_format, verify_checksums};
use crate::core::constants::*;
use crate::core::error::{Result, WfdbError};
use crate::core::format::{Dataset, Header};
use crate::core::header::parse_header;
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can produce the bytes behind a record location.
pub trait ByteSource {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Fetches records over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    dir: Option<String>,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, dir: None })
    }

    /// Appends `?dir=<dir>` to every request, for servers that host
    /// several record directories behind one path.
    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    fn url(&self, location: &str) -> Result<Url> {
        let mut url = Url::parse(location)
            .map_err(|e| WfdbError::InvalidLocation(format!("{}: {}", location, e)))?;
        if let Some(dir) = &self.dir {
            url.query_pairs_mut().append_pair("dir", dir);
        }
        Ok(url)
    }
}

impl ByteSource for HttpSource {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        let url = self.url(location)?;
        debug!("GET {}", url);
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

/// Reads records from the local filesystem, optionally below a root.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Resolves `location` against the root. With a root set, the result
    /// never leaves it: `..` and absolute components are rejected.
    fn path(&self, location: &str) -> Result<PathBuf> {
        let Some(root) = &self.root else {
            return Ok(PathBuf::from(location));
        };

        let relative = Path::new(location.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(WfdbError::InvalidLocation(format!(
                "{} is outside {}",
                location,
                root.display()
            )));
        }
        Ok(root.join(relative))
    }
}

impl ByteSource for FileSource {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.path(location)?;
        debug!("Reading {}", path.display());
        Ok(tokio::fs::read(&path).await?)
    }
}

pub struct WfdbReader<S> {
    source: S,
}

impl<S: ByteSource + Sync> WfdbReader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Loads the record whose header lives at `url` (must end in `.hea`).
    /// Returns `None` when the record cannot be loaded; the reason is logged.
    pub async fn load(&self, url: &str) -> Option<Dataset> {
        match self.try_load(url).await {
            Ok(dataset) => Some(dataset),
            Err(e) => {
                error!("Could not load WFDB record {}: {}", url, e);
                None
            }
        }
    }

    pub async fn try_load(&self, url: &str) -> Result<Dataset> {
        let base = url
            .strip_suffix(HEADER_EXTENSION)
            .ok_or_else(|| WfdbError::InvalidLocation(url.to_string()))?;

        let header_bytes = self.source.fetch(url).await?;
        let header = parse_header(&String::from_utf8_lossy(&header_bytes));
        if let Some(notes) = &header.notes {
            info!("Record {} notes:\n{}", header.name, notes);
        }

        // Reject unusable formats before fetching the sample file
        let needs_samples = resolve_format(&header)?.is_some();

        let sample_url = format!("{}{}", base, SAMPLE_EXTENSION);
        let annotation_url = format!("{}{}", base, ANNOTATION_EXTENSION);

        let (samples, annotations) = tokio::join!(
            async {
                if needs_samples {
                    self.source.fetch(&sample_url).await
                } else {
                    Ok(Vec::new())
                }
            },
            self.fetch_annotations(&annotation_url),
        );

        build(header, &samples?, &annotations)
    }

    async fn fetch_annotations(&self, url: &str) -> Vec<u8> {
        match self.source.fetch(url).await {
            Ok(bytes) => {
                debug!("Number of annotation bytes = {}", bytes.len());
                bytes
            }
            Err(e) => {
                warn!("Error loading annotations from {}: {}", url, e);
                Vec::new()
            }
        }
    }
}

/// Decodes an already fetched record.
pub fn assemble(header_text: &str, samples: &[u8], annotations: &[u8]) -> Result<Dataset> {
    build(parse_header(header_text), samples, annotations)
}

fn build(header: Header, samples: &[u8], annotations: &[u8]) -> Result<Dataset> {
    let mut signals = decode_samples(samples, &header)?;
    verify_checksums(&signals, &header);
    scale_signals(&mut signals, &header.signals);

    let annotations = decode_annotations(annotations);

    let mut signal_map = HashMap::new();
    for (index, spec) in header.signals.iter().enumerate() {
        if let Some(id) = &spec.id {
            signal_map.insert(id.clone(), index);
        }
    }

    info!(
        "Loaded record {}: {} signals, {} annotations",
        header.name,
        signals.len(),
        annotations.len()
    );

    Ok(Dataset {
        header,
        signals,
        signal_map,
        annotations,
    })
}
