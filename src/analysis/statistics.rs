//! Descriptive statistics over `f32` slices
//!
//! Population (not sample) variance throughout. Empty input yields 0.

use std::cmp::Ordering;

/// Arithmetic mean
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population variance
pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|&x| (x - m) * (x - m)).sum::<f32>() / values.len() as f32
}

/// Population standard deviation
pub fn std_dev(values: &[f32]) -> f32 {
    variance(values).sqrt()
}

/// Sorted copy of the input (NaN-tolerant ordering)
pub fn sorted(values: &[f32]) -> Vec<f32> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Percentile `q ∈ [0, 100]` of already-sorted values, linear interpolation
///
/// Matches the usual "linear" definition: position `q/100 · (n − 1)` between the
/// two nearest ranks.
pub fn percentile_sorted(sorted: &[f32], q: f32) -> f32 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let position = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f32;
            let lower = position.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            let fraction = position - lower as f32;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

/// Percentile `q ∈ [0, 100]` of unsorted values
///
/// # Example
///
/// ```
/// use cuepoint_dsp::analysis::statistics::percentile;
///
/// assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 50.0), 2.5);
/// assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 25.0), 1.75);
/// ```
pub fn percentile(values: &[f32], q: f32) -> f32 {
    percentile_sorted(&sorted(values), q)
}

/// Median
pub fn median(values: &[f32]) -> f32 {
    percentile(values, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(variance(&values), 4.0);
        assert_eq!(std_dev(&values), 2.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_median_odd_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[3.0, 1.0, 2.0, 10.0]), 2.5);
    }

    #[test]
    fn test_percentile_extremes() {
        let values = [5.0, 1.0, 9.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 9.0);
        assert_eq!(percentile(&values, 75.0), 7.0);
    }
}
