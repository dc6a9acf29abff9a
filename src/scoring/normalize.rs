/// Min-max scaling of a raw attribute across the site set, preserving order
/// and length. A degenerate sequence (`max == min`, including singletons)
/// maps uniformly to 0.0 rather than propagating 0/0.
pub fn minmax(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if span <= f64::EPSILON {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / span).collect()
}

/// `1 - value / reference_max`, for attributes where smaller raw values
/// should yield higher scores (tipping fee, risk, EJ burden).
pub fn inverse_linear(value: f64, reference_max: f64) -> f64 {
    1.0 - value / reference_max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minmax_scales_into_unit_interval() {
        let scaled = minmax(&[48.75, 85.0, 65.5]);
        assert_eq!(scaled.len(), 3);
        assert!((scaled[0] - 0.0).abs() < 1e-12);
        assert!((scaled[1] - 1.0).abs() < 1e-12);
        assert!(scaled[2] > 0.0 && scaled[2] < 1.0);
    }

    #[test]
    fn minmax_degenerate_is_uniform_zero() {
        assert_eq!(minmax(&[7.0, 7.0, 7.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(minmax(&[3.0]), vec![0.0]);
        assert!(minmax(&[]).is_empty());
    }

    #[test]
    fn inverse_linear_hits_endpoints() {
        assert_eq!(inverse_linear(85.0, 85.0), 0.0);
        assert_eq!(inverse_linear(0.0, 85.0), 1.0);
    }
}
