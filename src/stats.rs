use serde::Serialize;

use crate::error::{CompressError, Result};

/// Before/after size comparison for a single compression call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionStats {
    pub original_size: usize,
    pub compressed_size: usize,
    pub reduction_percent: f64,
    pub compression_ratio: f64,
}

/// Compute size statistics for one input/output pair.
///
/// Pure function of the two buffers, no I/O. An empty compressed buffer makes
/// the ratio undefined and fails with `DegenerateInput`; callers must treat
/// that as a failed compression, not a valid zero-size result.
pub fn stats(original: &[u8], compressed: &[u8]) -> Result<CompressionStats> {
    if original.is_empty() || compressed.is_empty() {
        return Err(CompressError::DegenerateInput);
    }

    let original_size = original.len();
    let compressed_size = compressed.len();
    let reduction =
        (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0;
    let ratio = original_size as f64 / compressed_size as f64;

    Ok(CompressionStats {
        original_size,
        compressed_size,
        reduction_percent: round2(reduction),
        compression_ratio: round2(ratio),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_matches_documented_example() {
        // 4,000 bytes in, 1,200 bytes out
        let original = vec![0u8; 4000];
        let compressed = vec![0u8; 1200];
        let s = stats(&original, &compressed).unwrap();
        assert_eq!(s.original_size, 4000);
        assert_eq!(s.compressed_size, 1200);
        assert_eq!(s.reduction_percent, 70.00);
        assert_eq!(s.compression_ratio, 3.33);
    }

    #[test]
    fn values_round_to_two_decimals() {
        let original = vec![0u8; 3];
        let compressed = vec![0u8; 7];
        let s = stats(&original, &compressed).unwrap();
        // (3 - 7) / 3 * 100 = -133.333...
        assert_eq!(s.reduction_percent, -133.33);
        assert_eq!(s.compression_ratio, 0.43);
    }

    #[test]
    fn growth_is_reported_as_negative_reduction() {
        let original = vec![0u8; 1000];
        let compressed = vec![0u8; 1500];
        let s = stats(&original, &compressed).unwrap();
        assert_eq!(s.reduction_percent, -50.00);
        assert_eq!(s.compression_ratio, 0.67);
    }

    #[test]
    fn empty_compressed_output_is_degenerate() {
        let err = stats(&[1, 2, 3], &[]).unwrap_err();
        assert!(matches!(err, CompressError::DegenerateInput));
    }

    #[test]
    fn empty_original_is_degenerate() {
        let err = stats(&[], &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, CompressError::DegenerateInput));
    }
}
