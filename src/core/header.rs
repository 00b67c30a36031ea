// Parser for the textual `.hea` header
//
// First line:  name[/segments] signals [freq[/counterFreq][(baseCounter)]] [samples] [time] [date]
// Signal line: file format [gain[(baseline)][/unit]] [res] [zero] [init] [checksum] [block] name...

use crate::core::constants::*;
use crate::core::format::{Adc, Header, SampleFormat, SignalSpec};
use chrono::{NaiveDate, NaiveTime};
use std::str::FromStr;
use tracing::{debug, warn};

const TIME_FORMATS: [&str; 3] = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Parses a complete header text. Never fails: malformed fields are
/// logged and left unset.
pub fn parse_header(text: &str) -> Header {
    let mut lines = text.lines();
    let mut header = parse_record_line(lines.next().unwrap_or(""));

    let mut notes: Vec<&str> = Vec::new();
    let mut pending_id: Option<String> = None;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(comment) = trimmed.strip_prefix('#') {
            let mut tokens = comment.split_whitespace();
            if tokens.next() == Some(ID_COMMENT_TAG) {
                pending_id = tokens.next().map(str::to_string);
            } else {
                notes.push(comment);
            }
            continue;
        }

        let mut signal = parse_signal_line(trimmed);
        match pending_id.take() {
            Some(id) => signal.id = Some(id),
            None => warn!(
                "No ID specified for signal {}. Insert a comment line of the form `# {} <id>` before the signal to specify an ID.",
                signal.name.as_deref().unwrap_or(&signal.file_name),
                ID_COMMENT_TAG
            ),
        }
        header.signals.push(signal);
    }

    if header.signals.len() != header.num_signals {
        warn!(
            "Header {} declares {} signals but describes {}",
            header.name,
            header.num_signals,
            header.signals.len()
        );
        header.num_signals = header.signals.len();
    }

    if !notes.is_empty() {
        header.notes = Some(notes.join("\n"));
    }

    debug!("Parsed header {}: {} signals", header.name, header.num_signals);
    header
}

fn parse_record_line(line: &str) -> Header {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let mut header = Header::default();

    // 0: name and optional number of segments
    if let Some(field) = fields.first() {
        let (name, segments) = split_once_opt(field, '/');
        header.name = name.to_string();
        header.num_segments = segments.and_then(|s| parse_field(s, "segment count"));
    }

    // 1: number of signals
    header.num_signals = fields
        .get(1)
        .and_then(|s| parse_field(s, "signal count"))
        .unwrap_or(0);

    // 2: sampling frequency, counter frequency and base counter value
    if let Some(field) = fields.get(2) {
        let (freqs, base_counter) = split_parenthesized(field);
        let (freq, counter) = split_once_opt(freqs, '/');
        header.sampling_frequency = parse_field(freq, "sampling frequency");
        header.counter_frequency = counter.and_then(|c| parse_field(c, "counter frequency"));
        header.base_counter = base_counter.and_then(|b| parse_field(b, "base counter value"));
    }

    // 3: number of samples per signal
    header.num_samples = fields
        .get(3)
        .and_then(|s| parse_field(s, "sample count"));

    // 4, 5: base time and date
    header.base_time = fields.get(4).and_then(|s| parse_time(s));
    header.base_date = fields.get(5).and_then(|s| parse_date(s));

    header
}

fn parse_signal_line(line: &str) -> SignalSpec {
    let fields: Vec<&str> = line.split_whitespace().collect();

    let file_name = fields.first().copied().unwrap_or_default().to_string();
    let format = SampleFormat::from_token(fields.get(1).copied().unwrap_or_default());
    let mut signal = SignalSpec::new(file_name, format);

    // 2: gain, optional (baseline), optional /unit
    if let Some(field) = fields.get(2) {
        let (adc, unit) = parse_adc(field);
        signal.adc = adc;
        signal.unit = unit;
    }

    signal.adc_resolution = fields.get(3).and_then(|s| parse_field(s, "ADC resolution"));
    signal.adc_zero = fields.get(4).and_then(|s| parse_field(s, "ADC zero"));
    signal.initial_value = fields.get(5).and_then(|s| parse_field(s, "initial value"));
    signal.checksum = fields.get(6).and_then(|s| parse_field(s, "checksum"));
    signal.block_size = fields.get(7).and_then(|s| parse_field(s, "block size"));

    if fields.len() >= SIGNAL_NAME_FIELD {
        signal.name = Some(fields[SIGNAL_NAME_FIELD..].join(" "));
    }

    signal
}

fn parse_adc(field: &str) -> (Adc, Option<String>) {
    let (values, unit) = split_once_opt(field, '/');
    let (gain, baseline) = split_parenthesized(values);

    let mut adc = Adc::default();
    if let Some(gain) = parse_field(gain, "ADC gain") {
        adc.gain = gain;
    }
    if let Some(baseline) = baseline.and_then(|b| parse_field(b, "baseline")) {
        adc.baseline = baseline;
    }

    let unit = unit.filter(|u| !u.is_empty()).map(str::to_string);
    (adc, unit)
}

fn parse_time(field: &str) -> Option<NaiveTime> {
    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(field, fmt).ok());
    if time.is_none() {
        warn!("Ignoring malformed base time: {}", field);
    }
    time
}

fn parse_date(field: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(field, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Ignoring malformed base date {}: {}", field, e);
            None
        }
    }
}

fn parse_field<T: FromStr>(value: &str, what: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring malformed {}: {:?}", what, value);
            None
        }
    }
}

fn split_once_opt(s: &str, sep: char) -> (&str, Option<&str>) {
    match s.split_once(sep) {
        Some((head, tail)) => (head, Some(tail)),
        None => (s, None),
    }
}

/// Splits `"value(inner)"` into `("value", Some("inner"))`.
fn split_parenthesized(s: &str) -> (&str, Option<&str>) {
    match s.split_once('(') {
        Some((head, rest)) => (head, Some(rest.split(')').next().unwrap_or(rest))),
        None => (s, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIDMC: &str = "bidmc01 5 125 60001
# @pcof RESP
bidmc01.dat 16 10000(0)/pm 16 0 3692 -25345 0 RESP,
# @pcof PLETH
bidmc01.dat 16 10000(0)/NU 16 0 2195 -16839 0 PLETH,
# @pcof V
bidmc01.dat 16 1000(0)/mV 16 0 218 27213 0 V,
# @pcof AVR
bidmc01.dat 16 1000(0)/mV 16 0 135 -21106 0 AVR,
# @pcof II
bidmc01.dat 16 1000(0)/mV 16 0 -163 -31213 0 II,
# <age>: 88 <sex>: F
# <location>: micu
";

    #[test]
    fn test_record_line() {
        let header = parse_header("set001/3 8 360/0.476(12) 1376831 10:31:04 23/11/2021");
        assert_eq!(header.name, "set001");
        assert_eq!(header.num_segments, Some(3));
        assert_eq!(header.sampling_frequency, Some(360.0));
        assert_eq!(header.counter_frequency, Some(0.476));
        assert_eq!(header.base_counter, Some(12.0));
        assert_eq!(header.num_samples, Some(1376831));
        assert_eq!(header.base_time, NaiveTime::from_hms_opt(10, 31, 4));
        assert_eq!(header.base_date, NaiveDate::from_ymd_opt(2021, 11, 23));
    }

    #[test]
    fn test_optional_fields_stay_unset() {
        let header = parse_header("rec 0");
        assert_eq!(header.name, "rec");
        assert_eq!(header.num_signals, 0);
        assert_eq!(header.num_segments, None);
        assert_eq!(header.sampling_frequency, None);
        assert_eq!(header.counter_frequency, None);
        assert_eq!(header.num_samples, None);
        assert_eq!(header.notes, None);

        let zero = parse_header("rec 0 0 0");
        assert_eq!(zero.sampling_frequency, Some(0.0));
        assert_eq!(zero.num_samples, Some(0));
        assert_ne!(header, zero);
    }

    #[test]
    fn test_signal_lines_and_notes() {
        let header = parse_header(BIDMC);
        assert_eq!(header.num_signals, 5);
        assert_eq!(header.signals.len(), 5);

        let resp = &header.signals[0];
        assert_eq!(resp.id.as_deref(), Some("RESP"));
        assert_eq!(resp.file_name, "bidmc01.dat");
        assert_eq!(resp.format, SampleFormat::Linear16);
        assert_eq!(resp.adc.gain, 10000.0);
        assert_eq!(resp.adc.baseline, 0);
        assert_eq!(resp.unit.as_deref(), Some("pm"));
        assert_eq!(resp.adc_resolution, Some(16));
        assert_eq!(resp.initial_value, Some(3692));
        assert_eq!(resp.checksum, Some(-25345));
        assert_eq!(resp.block_size, Some(0));
        assert_eq!(resp.name.as_deref(), Some("RESP,"));

        assert_eq!(header.signals[4].id.as_deref(), Some("II"));
        assert_eq!(
            header.notes.as_deref(),
            Some(" <age>: 88 <sex>: F\n <location>: micu")
        );
    }

    #[test]
    fn test_adc_defaults() {
        let header = parse_header("rec 2 250 1000\n# @pcof a\nrec.dat 212\n# @pcof b\nrec.dat 212 400/mV");
        assert_eq!(header.signals[0].adc, Adc { gain: 200.0, baseline: 0 });
        assert_eq!(header.signals[0].unit, None);
        assert_eq!(header.signals[0].name, None);
        assert_eq!(header.signals[1].adc, Adc { gain: 400.0, baseline: 0 });
        assert_eq!(header.signals[1].unit.as_deref(), Some("mV"));
    }

    #[test]
    fn test_adc_baseline_without_unit() {
        let header = parse_header("rec 1\n# @pcof a\nrec.dat 16 1000(-12)");
        assert_eq!(header.signals[0].adc, Adc { gain: 1000.0, baseline: -12 });
        assert_eq!(header.signals[0].unit, None);
    }

    #[test]
    fn test_missing_id_is_tolerated() {
        let header = parse_header("rec 2\nrec.dat 16\n# @pcof second\nrec.dat 16");
        assert_eq!(header.signals[0].id, None);
        assert_eq!(header.signals[1].id.as_deref(), Some("second"));
    }

    #[test]
    fn test_pending_id_applies_once() {
        let header = parse_header("rec 2\n#@pcof first\nrec.dat 16\nrec.dat 16");
        assert_eq!(header.signals[0].id.as_deref(), Some("first"));
        assert_eq!(header.signals[1].id, None);
    }

    #[test]
    fn test_unsupported_format_is_kept() {
        let header = parse_header("rec 1\nrec.dat 80");
        assert_eq!(
            header.signals[0].format,
            SampleFormat::Unsupported("80".to_string())
        );
    }

    #[test]
    fn test_signal_count_follows_signal_lines() {
        let header = parse_header("rec 3 250\nrec.dat 16");
        assert_eq!(header.num_signals, 1);
        assert_eq!(header.signals.len(), 1);
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse_header(BIDMC), parse_header(BIDMC));
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let header = parse_header("rec 1 125\r\n\r\n# @pcof x\r\nrec.dat 16 100/mV\r\n");
        assert_eq!(header.sampling_frequency, Some(125.0));
        assert_eq!(header.signals[0].id.as_deref(), Some("x"));
        assert_eq!(header.signals[0].unit.as_deref(), Some("mV"));
    }

    #[test]
    fn test_malformed_base_time_is_ignored() {
        let header = parse_header("rec 0 250 10 noon");
        assert_eq!(header.num_samples, Some(10));
        assert_eq!(header.base_time, None);
    }
}
