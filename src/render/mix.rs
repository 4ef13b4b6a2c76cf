use crate::wave::Sample;

/// Places `incoming` into `output` starting at frame `offset`.
///
/// Frames that overlap existing output are mixed with [`Sample::combine`]
/// (each side halved, then summed); the rest are appended unchanged. A gap
/// between the end of `output` and `offset` is filled with silence.
pub fn append_or_combine(output: &mut Vec<Sample>, incoming: &[Sample], offset: usize) {
    if output.len() < offset {
        output.resize(offset, Sample::default());
    }
    let overlap = (output.len() - offset).min(incoming.len());
    for (existing, new) in output[offset..offset + overlap].iter_mut().zip(incoming) {
        *existing = existing.combine(new);
    }
    output.extend_from_slice(&incoming[overlap..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(values: &[i16]) -> Vec<Sample> {
        values.iter().map(|&v| Sample::from_i16(v, v)).collect()
    }

    fn lefts(samples: &[Sample]) -> Vec<i16> {
        samples.iter().map(Sample::left_i16).collect()
    }

    #[test]
    fn test_append_to_empty() {
        let mut out = Vec::new();
        append_or_combine(&mut out, &frames(&[1, 2, 3]), 0);
        assert_eq!(lefts(&out), vec![1, 2, 3]);
    }

    #[test]
    fn test_partial_overlap() {
        let mut out = frames(&[1000, 400, 8]);
        append_or_combine(&mut out, &frames(&[-2000, 100, 50]), 1);
        assert_eq!(lefts(&out), vec![1000, -800, 54, 50]);
    }

    #[test]
    fn test_full_overlap_keeps_length() {
        let mut out = frames(&[10, 20, 30, 40]);
        append_or_combine(&mut out, &frames(&[0, 0]), 1);
        assert_eq!(lefts(&out), vec![10, 10, 15, 40]);
    }

    #[test]
    fn test_gap_is_filled_with_silence() {
        let mut out = frames(&[7]);
        append_or_combine(&mut out, &frames(&[9]), 3);
        assert_eq!(lefts(&out), vec![7, 0, 0, 9]);
    }
}
