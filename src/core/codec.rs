// Sample file codecs: format 212 and format 16 decoding, format 16 encoding

use crate::core::constants::*;
use crate::core::error::{Result, WfdbError};
use crate::core::format::{Adc, Dataset, Header, SampleFormat};
use serde::Serialize;
use tracing::{debug, warn};

/// Output of [`encode_16`]: header text and matching sample bytes.
#[derive(Debug, Clone, Serialize)]
pub struct Encoded {
    pub header: String,
    pub data: Vec<u8>,
}

/// Checks that every signal shares one supported format.
/// Returns `None` for a header without signals.
pub fn resolve_format(header: &Header) -> Result<Option<SampleFormat>> {
    let mut signals = header.signals.iter();
    let first = match signals.next() {
        Some(signal) => &signal.format,
        None => return Ok(None),
    };

    if let Some(other) = signals.find(|s| s.format != *first) {
        return Err(WfdbError::MixedFormats {
            first: first.to_string(),
            other: other.format.to_string(),
        });
    }

    match first {
        SampleFormat::Unsupported(token) => Err(WfdbError::UnsupportedFormat(token.clone())),
        format => Ok(Some(format.clone())),
    }
}

/// Decodes a sample file into raw ADC codes, one sequence per signal.
pub fn decode_samples(data: &[u8], header: &Header) -> Result<Vec<Vec<f64>>> {
    match resolve_format(header)? {
        Some(SampleFormat::Packed212) => decode_212(data, header),
        Some(SampleFormat::Linear16) => decode_16(data, header),
        Some(SampleFormat::Unsupported(token)) => Err(WfdbError::UnsupportedFormat(token)),
        None => Ok(Vec::new()),
    }
}

/// Format 212: two 12-bit codes in three bytes.
pub fn decode_212(data: &[u8], header: &Header) -> Result<Vec<Vec<f64>>> {
    let num_values = data.len() * 2 / 3;
    let mut index = 0;
    let mut split = false;

    fill_round_robin(header, num_values, || {
        let v = if split {
            let b1 = *data.get(index + 1)?;
            let b2 = *data.get(index + 2)?;
            index += 3;
            split = false;
            ((b1 as i32 & 0xf0) << 4) | b2 as i32
        } else {
            let b0 = *data.get(index)?;
            let b1 = *data.get(index + 1)?;
            split = true;
            ((b1 as i32 & 0x0f) << 8) | b0 as i32
        };

        let v = if v >= F212_SIGN_THRESHOLD { v - F212_WRAP } else { v };
        Some(v as f64)
    })
}

/// Format 16: little-endian signed 16-bit codes.
pub fn decode_16(data: &[u8], header: &Header) -> Result<Vec<Vec<f64>>> {
    let mut samples = data.chunks_exact(2);

    fill_round_robin(header, data.len() / 2, || {
        samples
            .next()
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f64)
    })
}

/// Fills `num_signals` buffers round-robin from `next`, which yields
/// `None` once the input is exhausted.
///
/// A trailing partial frame is zero-padded. A declared sample count
/// beyond the frames the data can supply is rejected.
fn fill_round_robin<F>(header: &Header, num_values: usize, mut next: F) -> Result<Vec<Vec<f64>>>
where
    F: FnMut() -> Option<f64>,
{
    let num_signals = header.num_signals;
    if num_signals == 0 {
        return Ok(Vec::new());
    }

    let available = num_values.div_ceil(num_signals);
    let num_samples = header.num_samples.unwrap_or(num_values / num_signals);
    if num_samples > available {
        return Err(WfdbError::CorruptedData(format!(
            "header {} declares {} samples per signal, data holds {}",
            header.name, num_samples, available
        )));
    }

    let mut signals = vec![vec![0.0; num_samples]; num_signals];

    'outer: for out_index in 0..num_samples {
        for (sig_index, signal) in signals.iter_mut().enumerate() {
            match next() {
                Some(v) => signal[out_index] = v,
                None => {
                    warn!(
                        "Sample data ends at sample {} of {} (signal {}), padding with zeros",
                        out_index, num_samples, sig_index
                    );
                    break 'outer;
                }
            }
        }
    }

    debug!("Decoded {} signals x {} samples", num_signals, num_samples);
    Ok(signals)
}

/// 16-bit wrapping sum of a signal's raw codes, as stored in headers.
pub fn checksum(raw: &[f64]) -> i16 {
    raw.iter().fold(0i16, |sum, &v| sum.wrapping_add(v as i64 as i16))
}

/// Compares declared checksums against the decoded raw samples.
/// Returns the indices of signals that do not match.
pub fn verify_checksums(raw: &[Vec<f64>], header: &Header) -> Vec<usize> {
    let mut mismatched = Vec::new();
    for (index, (values, spec)) in raw.iter().zip(&header.signals).enumerate() {
        let Some(expected) = spec.checksum else {
            continue;
        };
        let actual = checksum(values);
        if actual != expected as i16 {
            warn!(
                "Checksum mismatch for signal {} of {}: header {}, data {}",
                index, header.name, expected, actual
            );
            mismatched.push(index);
        }
    }
    mismatched
}

fn to_raw_16(physical: f64, adc: Adc) -> u16 {
    let mut v = adc.to_raw(physical).round();
    if v < 0.0 {
        // Two's complement
        v += 65536.0;
    }
    v.clamp(0.0, 65535.0) as u16
}

/// Exports a dataset as a format 16 sample file plus a matching header.
pub fn encode_16(dataset: &Dataset) -> Encoded {
    let header = &dataset.header;
    let signals = &dataset.signals;
    let num_samples = dataset.num_samples();
    let num_signals = signals.len();

    let mut data = Vec::with_capacity(num_samples * num_signals * 2);
    let mut raw: Vec<Vec<f64>> = vec![Vec::with_capacity(num_samples); num_signals];

    for sample_index in 0..num_samples {
        for (sig_index, signal) in signals.iter().enumerate() {
            let adc = header
                .signals
                .get(sig_index)
                .map(|s| s.adc)
                .unwrap_or_default();
            let physical = signal.get(sample_index).copied().unwrap_or(0.0);
            let v = to_raw_16(physical, adc);
            data.extend_from_slice(&v.to_le_bytes());
            raw[sig_index].push(v as i16 as f64);
        }
    }

    let frequency = dataset.sampling_frequency();
    let mut lines = vec![format!(
        "{} {} {} {}",
        header.name, num_signals, frequency, num_samples
    )];

    for (sig_index, values) in raw.iter().enumerate() {
        let spec = header.signals.get(sig_index);
        let adc = spec.map(|s| s.adc).unwrap_or_default();

        if let Some(id) = spec.and_then(|s| s.id.as_deref()) {
            lines.push(format!("# {} {}", ID_COMMENT_TAG, id));
        }

        let mut line = format!("{}{} {} {}({})", header.name, SAMPLE_EXTENSION, FORMAT_16, adc.gain, adc.baseline);
        if let Some(unit) = spec.and_then(|s| s.unit.as_deref()) {
            line.push('/');
            line.push_str(unit);
        }
        if let Some(name) = spec.and_then(|s| s.name.as_deref()) {
            let initial = values.first().copied().unwrap_or(0.0) as i64;
            line.push_str(&format!(" 16 0 {} {} 0 {}", initial, checksum(values), name));
        }
        lines.push(line);
    }

    Encoded {
        header: lines.join("\n"),
        data,
    }
}
