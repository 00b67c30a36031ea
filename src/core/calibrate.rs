// Conversion of raw ADC codes to physical units

use crate::core::format::SignalSpec;

/// Rescales every signal in place: `v = (raw - baseline) / gain`.
///
/// Gain is not validated; a zero gain yields infinities or NaN.
pub fn scale_signals(signals: &mut [Vec<f64>], specs: &[SignalSpec]) {
    for (values, spec) in signals.iter_mut().zip(specs) {
        let adc = spec.adc;
        for v in values.iter_mut() {
            *v = adc.to_physical(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::{Adc, SampleFormat};

    fn spec(gain: f64, baseline: i64) -> SignalSpec {
        let mut spec = SignalSpec::new("rec.dat".to_string(), SampleFormat::Linear16);
        spec.adc = Adc { gain, baseline };
        spec
    }

    #[test]
    fn test_default_gain_is_exact() {
        let mut signals = vec![vec![200.0, 0.0, -100.0]];
        scale_signals(&mut signals, &[spec(200.0, 0)]);
        assert_eq!(signals[0], vec![1.0, 0.0, -0.5]);
    }

    #[test]
    fn test_baseline_is_subtracted_per_signal() {
        let mut signals = vec![vec![1024.0], vec![1024.0]];
        scale_signals(&mut signals, &[spec(200.0, 1024), spec(100.0, 24)]);
        assert_eq!(signals, vec![vec![0.0], vec![10.0]]);
    }

    #[test]
    fn test_zero_gain_follows_float_semantics() {
        let mut signals = vec![vec![5.0, 0.0]];
        scale_signals(&mut signals, &[spec(0.0, 0)]);
        assert_eq!(signals[0][0], f64::INFINITY);
        assert!(signals[0][1].is_nan());
    }
}
