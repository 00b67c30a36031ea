// Decoder for the compact binary annotation stream
//
// Each 16-bit little-endian word holds a 6-bit code (A) in the top bits
// and a 10-bit data field (I). Codes 59..=63 are escapes.

use crate::core::constants::*;
use crate::core::format::Annotation;
use tracing::{debug, trace, warn};

/// NUM/SUB/CHN values in effect while decoding. Tracked but not
/// attached to the emitted records.
#[derive(Debug, Default, Clone, Copy)]
struct AnnotationContext {
    num: u16,
    sub_type: u16,
    channel: u16,
}

pub fn decode_annotations(data: &[u8]) -> Vec<Annotation> {
    let mut res: Vec<Annotation> = Vec::new();
    let mut ctx = AnnotationContext::default();
    let mut abs_time: i64 = 0;
    let mut i = 0;

    while i + 1 < data.len() {
        let lsb = data[i];
        let msb = data[i + 1];
        let code = msb >> 2;
        let value = (((msb & 0x3) as u16) << 8) | lsb as u16;

        match code {
            ANN_SKIP => {
                let Some(payload) = data.get(i + 2..i + 2 + SKIP_PAYLOAD_SIZE) else {
                    warn!("Truncated SKIP at byte {}", i);
                    break;
                };
                // High 16 bits first, low byte first within each half
                let high = u16::from_le_bytes([payload[0], payload[1]]) as u32;
                let low = u16::from_le_bytes([payload[2], payload[3]]) as u32;
                let interval = ((high << 16) | low) as i32;
                abs_time += interval as i64;
                trace!("SKIP {} -> t = {}", interval, abs_time);
                i += SKIP_PAYLOAD_SIZE;
            }
            ANN_NUM => ctx.num = value,
            ANN_SUB => ctx.sub_type = value,
            ANN_CHN => ctx.channel = value,
            ANN_AUX => {
                let len = value as usize;
                let start = i + 2;
                let end = (start + len).min(data.len());
                let text = String::from_utf8_lossy(&data[start..end]);
                let text = text.trim_end_matches('\0').to_string();
                trace!("AUX {:?} ({} bytes) channel = {}", text, len, ctx.channel);

                match res.last_mut() {
                    Some(last) => last.aux = Some(text),
                    None => warn!("AUX before any annotation, dropped: {:?}", text),
                }
                // Odd lengths carry one pad byte
                i += (len + 1) & !1;
            }
            _ => {
                abs_time += value as i64;
                trace!("{} at {} (sub = {})", code, abs_time, ctx.sub_type);
                res.push(Annotation::new(abs_time, code));
                // SUB applies to one annotation only
                ctx.sub_type = 0;
            }
        }

        i += 2;
    }

    if i + 1 == data.len() {
        debug!("Ignoring trailing odd byte in annotation stream");
    }

    debug!(
        "Decoded {} annotations (last num = {}, chan = {})",
        res.len(),
        ctx.num,
        ctx.channel
    );
    res
}

/// Index `k` of the annotation interval containing `t`, i.e.
/// `annotations[k].t <= t < annotations[k + 1].t`.
pub fn find_annotation_interval(annotations: &[Annotation], t: i64) -> Option<usize> {
    if annotations.len() < 2 {
        return None;
    }

    let mut start = 0;
    let mut end = annotations.len() - 1;
    if t < annotations[start].t || t >= annotations[end].t {
        return None;
    }

    while end - start > 1 {
        let index = (start + end) / 2;
        if annotations[index].t > t {
            end = index;
        } else {
            start = index;
        }
    }

    Some(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(code: u8, value: u16) -> [u8; 2] {
        [(value & 0xff) as u8, (code << 2) | ((value >> 8) & 0x3) as u8]
    }

    fn stream(words: &[[u8; 2]]) -> Vec<u8> {
        words.iter().flatten().copied().collect()
    }

    #[test]
    fn test_normal_annotations_accumulate_time() {
        let data = stream(&[word(1, 100), word(5, 1023), word(28, 0)]);
        let annots = decode_annotations(&data);
        assert_eq!(
            annots,
            vec![
                Annotation::new(100, 1),
                Annotation::new(1123, 5),
                Annotation::new(1123, 28),
            ]
        );
    }

    #[test]
    fn test_skip_advances_time_without_record() {
        let mut data = stream(&[word(1, 10), word(ANN_SKIP, 0)]);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
        data.extend_from_slice(&word(1, 5));

        let annots = decode_annotations(&data);
        assert_eq!(annots.len(), 2);
        assert_eq!(annots[0].t, 10);
        // high half 0x0000, low half 0x0100
        assert_eq!(annots[1].t, 10 + 256 + 5);
    }

    #[test]
    fn test_skip_high_half() {
        let mut data = stream(&[word(ANN_SKIP, 0)]);
        data.extend_from_slice(&[0x01, 0x00, 0x02, 0x00]);
        data.extend_from_slice(&word(1, 0));

        let annots = decode_annotations(&data);
        assert_eq!(annots, vec![Annotation::new((1 << 16) + 2, 1)]);
    }

    #[test]
    fn test_aux_attaches_to_previous_record() {
        let mut data = stream(&[word(1, 7), word(ANN_AUX, 4)]);
        data.extend_from_slice(b"ab\0\0");

        let annots = decode_annotations(&data);
        assert_eq!(annots.len(), 1);
        assert_eq!(annots[0].t, 7);
        assert_eq!(annots[0].aux.as_deref(), Some("ab"));
    }

    #[test]
    fn test_odd_aux_length_skips_pad_byte() {
        let mut data = stream(&[word(28, 3), word(ANN_AUX, 3)]);
        data.extend_from_slice(b"(N\0\0");
        data.extend_from_slice(&word(1, 2));

        let annots = decode_annotations(&data);
        assert_eq!(annots.len(), 2);
        assert_eq!(annots[0].aux.as_deref(), Some("(N"));
        assert_eq!(annots[1], Annotation::new(5, 1));
    }

    #[test]
    fn test_aux_before_any_record_is_dropped() {
        let mut data = stream(&[word(ANN_AUX, 2)]);
        data.extend_from_slice(b"xy");
        data.extend_from_slice(&word(1, 1));
        assert_eq!(decode_annotations(&data), vec![Annotation::new(1, 1)]);
    }

    #[test]
    fn test_context_codes_emit_nothing() {
        let data = stream(&[
            word(ANN_NUM, 3),
            word(ANN_CHN, 1),
            word(ANN_SUB, 2),
            word(1, 4),
        ]);
        assert_eq!(decode_annotations(&data), vec![Annotation::new(4, 1)]);
    }

    #[test]
    fn test_truncated_input_does_not_panic() {
        let mut data = stream(&[word(1, 1), word(ANN_SKIP, 0)]);
        data.push(0x00);
        assert_eq!(decode_annotations(&data), vec![Annotation::new(1, 1)]);

        let mut data = stream(&[word(1, 1), word(ANN_AUX, 10)]);
        data.extend_from_slice(b"abc");
        let annots = decode_annotations(&data);
        assert_eq!(annots[0].aux.as_deref(), Some("abc"));

        assert!(decode_annotations(&[0x01]).is_empty());
        assert!(decode_annotations(&[]).is_empty());
    }

    #[test]
    fn test_find_annotation_interval() {
        let annots: Vec<_> = [0, 10, 20, 30]
            .iter()
            .map(|&t| Annotation::new(t, 1))
            .collect();

        assert_eq!(find_annotation_interval(&annots, 0), Some(0));
        assert_eq!(find_annotation_interval(&annots, 15), Some(1));
        assert_eq!(find_annotation_interval(&annots, 20), Some(2));
        assert_eq!(find_annotation_interval(&annots, 29), Some(2));
        assert_eq!(find_annotation_interval(&annots, 30), None);
        assert_eq!(find_annotation_interval(&annots, -1), None);
        assert_eq!(find_annotation_interval(&annots[..1], 0), None);
    }
}
