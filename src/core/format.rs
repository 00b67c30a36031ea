// Data structures for WFDB records

use crate::core::constants::*;
use crate::core::error::{Result, WfdbError};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Storage format of a signal's samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    /// Two samples packed into three bytes
    Packed212,
    /// Little-endian signed 16-bit samples
    Linear16,
    /// Any other format field, kept verbatim
    Unsupported(String),
}

impl SampleFormat {
    pub fn from_token(token: &str) -> Self {
        match token.parse::<i64>() {
            Ok(FORMAT_212) => SampleFormat::Packed212,
            Ok(FORMAT_16) => SampleFormat::Linear16,
            _ => SampleFormat::Unsupported(token.to_string()),
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleFormat::Packed212 => write!(f, "{}", FORMAT_212),
            SampleFormat::Linear16 => write!(f, "{}", FORMAT_16),
            SampleFormat::Unsupported(token) => write!(f, "{}", token),
        }
    }
}

/// Affine calibration: `physical = (raw - baseline) / gain`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adc {
    pub gain: f64,
    pub baseline: i64,
}

impl Default for Adc {
    fn default() -> Self {
        Self {
            gain: DEFAULT_ADC_GAIN,
            baseline: DEFAULT_BASELINE,
        }
    }
}

impl Adc {
    pub fn to_physical(&self, raw: f64) -> f64 {
        (raw - self.baseline as f64) / self.gain
    }

    pub fn to_raw(&self, physical: f64) -> f64 {
        physical * self.gain + self.baseline as f64
    }
}

/// One signal description line of a header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    /// Set only by a preceding `# @pcof <id>` comment
    pub id: Option<String>,
    pub file_name: String,
    pub format: SampleFormat,
    pub adc: Adc,
    pub unit: Option<String>,
    pub name: Option<String>,
    pub adc_resolution: Option<i64>,
    pub adc_zero: Option<i64>,
    pub initial_value: Option<i64>,
    pub checksum: Option<i64>,
    pub block_size: Option<i64>,
}

impl SignalSpec {
    pub fn new(file_name: String, format: SampleFormat) -> Self {
        Self {
            id: None,
            file_name,
            format,
            adc: Adc::default(),
            unit: None,
            name: None,
            adc_resolution: None,
            adc_zero: None,
            initial_value: None,
            checksum: None,
            block_size: None,
        }
    }

    /// Best available label: id, then display name.
    pub fn label(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }
}

/// Parsed `.hea` header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub num_segments: Option<u32>,
    pub num_signals: usize,
    pub sampling_frequency: Option<f64>,
    pub counter_frequency: Option<f64>,
    pub base_counter: Option<f64>,
    pub num_samples: Option<usize>,
    pub base_time: Option<NaiveTime>,
    pub base_date: Option<NaiveDate>,
    pub signals: Vec<SignalSpec>,
    pub notes: Option<String>,
}

/// A single decoded annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Absolute time in samples
    pub t: i64,
    pub code: u8,
    pub aux: Option<String>,
}

impl Annotation {
    pub fn new(t: i64, code: u8) -> Self {
        Self { t, code, aux: None }
    }

    pub fn info(&self) -> Option<&'static AnnotationCode> {
        annotation_code(self.code)
    }

    pub fn symbol(&self) -> &'static str {
        self.info().map(|c| c.symbol).unwrap_or("")
    }

    pub fn is_beat(&self) -> bool {
        self.info().map(|c| c.beat).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeseriesChunk {
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
}

impl TimeseriesChunk {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(cap),
            values: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// A fully decoded record: header, calibrated signals and annotations.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub header: Header,
    /// One sample-major sequence per signal, aligned with `header.signals`
    pub signals: Vec<Vec<f64>>,
    /// Signal id -> index into `signals`
    pub signal_map: HashMap<String, usize>,
    pub annotations: Vec<Annotation>,
}

impl Dataset {
    pub fn signal(&self, id: &str) -> Option<&[f64]> {
        self.signal_map
            .get(id)
            .and_then(|&index| self.signals.get(index))
            .map(Vec::as_slice)
    }

    /// Label for a signal index, falling back to `signal<N>`.
    pub fn signal_label(&self, index: usize) -> String {
        self.header
            .signals
            .get(index)
            .and_then(SignalSpec::label)
            .map(str::to_string)
            .unwrap_or_else(|| format!("signal{}", index))
    }

    pub fn list_signals(&self) -> Vec<(usize, String)> {
        (0..self.signals.len())
            .map(|index| (index, self.signal_label(index)))
            .collect()
    }

    pub fn num_samples(&self) -> usize {
        self.header
            .num_samples
            .or_else(|| self.signals.first().map(Vec::len))
            .unwrap_or(0)
    }

    /// Declared frequency, or the WFDB default when it is absent or
    /// not a positive number.
    pub fn sampling_frequency(&self) -> f64 {
        self.header
            .sampling_frequency
            .filter(|fs| fs.is_finite() && *fs > 0.0)
            .unwrap_or(DEFAULT_SAMPLING_FREQUENCY)
    }

    /// Samples of one signal with `start <= t <= end`, times in seconds.
    pub fn read_time_range(&self, index: usize, start: f64, end: f64) -> Result<TimeseriesChunk> {
        let values = self
            .signals
            .get(index)
            .ok_or_else(|| WfdbError::SignalNotFound(index.to_string()))?;

        let fs = self.sampling_frequency();
        let first = (start.max(0.0) * fs).ceil() as usize;
        let last = if end < 0.0 {
            0
        } else {
            ((end * fs).floor() as usize).saturating_add(1).min(values.len())
        };

        let mut chunk = TimeseriesChunk::with_capacity(last.saturating_sub(first));
        for (i, &v) in values.iter().enumerate().take(last).skip(first) {
            chunk.timestamps.push(i as f64 / fs);
            chunk.values.push(v);
        }

        Ok(chunk)
    }
}
