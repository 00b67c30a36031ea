// Example usage of the WFDB reader

use std::time::Duration;
use tracing::{debug, info, Level};
use wfdb::{encode_16, find_annotation_interval, ByteSource, FileSource, HttpSource, WfdbReader};

async fn load<S: ByteSource + Sync>(source: S, location: &str) -> anyhow::Result<wfdb::Dataset> {
    Ok(WfdbReader::new(source).try_load(location).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let location = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/bidmc01.hea".to_string());

    let dataset = if location.starts_with("http://") || location.starts_with("https://") {
        load(HttpSource::new(Duration::from_secs(30))?, &location).await?
    } else {
        load(FileSource::new(), &location).await?
    };

    let header = &dataset.header;
    info!(
        "Record {}: {} signals, {} samples at {} Hz",
        header.name,
        header.num_signals,
        dataset.num_samples(),
        dataset.sampling_frequency()
    );

    // List all signals
    for (index, label) in dataset.list_signals() {
        let spec = &header.signals[index];
        info!(
            "  [{}] {} ({}, gain {}, baseline {})",
            index,
            label,
            spec.unit.as_deref().unwrap_or("-"),
            spec.adc.gain,
            spec.adc.baseline
        );
    }

    // First ten seconds of the first signal
    if !dataset.signals.is_empty() {
        let range = dataset.read_time_range(0, 0.0, 10.0)?;
        info!("Records in [0, 10] s: {}", range.len());
        if let (Some(min), Some(max)) = (
            range.values.iter().copied().reduce(f64::min),
            range.values.iter().copied().reduce(f64::max),
        ) {
            info!("Range: {} .. {}", min, max);
        }
    }

    // Annotations around the 15 minute mark
    let start = (15.0 * 60.0 * dataset.sampling_frequency()) as i64;
    if let Some(first) = find_annotation_interval(&dataset.annotations, start) {
        for annot in dataset.annotations.iter().skip(first).take(10) {
            debug!(
                "  t={} {} {}",
                annot.t,
                annot.symbol(),
                annot.aux.as_deref().unwrap_or("")
            );
        }
    }
    info!("Annotations: {}", dataset.annotations.len());

    // Export to format 16
    let encoded = encode_16(&dataset);
    let out_dir = std::env::temp_dir().join("wfdb-export");
    tokio::fs::create_dir_all(&out_dir).await?;
    let hea = out_dir.join(format!("{}.hea", header.name));
    let dat = out_dir.join(format!("{}.dat", header.name));
    tokio::fs::write(&hea, &encoded.header).await?;
    tokio::fs::write(&dat, &encoded.data).await?;
    info!("Exported {} and {}", hea.display(), dat.display());

    Ok(())
}
