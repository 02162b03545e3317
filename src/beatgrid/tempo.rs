//! Tempo estimation from beat timestamps
//!
//! # Algorithm
//!
//! 1. Drop beats closer than the minimum interval to the previous retained beat
//! 2. Reject inter-beat interval outliers outside `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`
//! 3. Beat period = median surviving interval, BPM = 60 / period
//! 4. Confidence = `max(0, 1 − std / median)`, ×1.1 (capped at 1) when more than
//!    10 intervals survive

use crate::analysis::statistics::{median, percentile_sorted, sorted, std_dev};

/// Default minimum spacing between retained beats in seconds
pub const DEFAULT_MIN_BEAT_INTERVAL: f32 = 0.2;

/// Remove beats closer than `min_interval` to the previous retained beat
///
/// The first beat is always kept; the output preserves input order.
///
/// # Example
///
/// ```
/// use cuepoint_dsp::beatgrid::tempo::filter_close_beats;
///
/// let beats = [0.0, 0.1, 0.5, 0.51, 1.0, 1.05, 1.5];
/// assert_eq!(filter_close_beats(&beats, 0.2), vec![0.0, 0.5, 1.0, 1.5]);
/// ```
pub fn filter_close_beats(beats: &[f32], min_interval: f32) -> Vec<f32> {
    let mut retained: Vec<f32> = Vec::with_capacity(beats.len());
    for &beat in beats {
        match retained.last() {
            Some(&last) if beat - last < min_interval => {}
            _ => retained.push(beat),
        }
    }
    retained
}

/// Tempo and its self-reported reliability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEstimate {
    /// Tempo in BPM
    pub bpm: f32,
    /// Confidence (0.0-1.0)
    pub confidence: f32,
    /// Intervals that survived outlier rejection
    pub intervals_used: usize,
}

/// Outlier-robust tempo estimator shared by every beat tracking backend
#[derive(Debug, Clone)]
pub struct TempoEstimator {
    /// IQR multiplier for the outlier fences (default: 1.5)
    pub iqr_factor: f32,
    /// Surviving intervals above which the confidence bonus applies (default: 10)
    pub bonus_min_intervals: usize,
    /// Confidence multiplier for long, consistent grids (default: 1.1)
    pub bonus_factor: f32,
}

impl Default for TempoEstimator {
    fn default() -> Self {
        Self {
            iqr_factor: 1.5,
            bonus_min_intervals: 10,
            bonus_factor: 1.1,
        }
    }
}

impl TempoEstimator {
    /// Estimate tempo from ascending beat times
    ///
    /// Returns `None` with fewer than 2 beats or a non-positive median interval.
    pub fn estimate(&self, beats: &[f32]) -> Option<TempoEstimate> {
        let intervals: Vec<f32> = beats.windows(2).map(|w| w[1] - w[0]).collect();
        self.estimate_from_intervals(&intervals)
    }

    /// Estimate tempo from inter-beat intervals in seconds
    pub fn estimate_from_intervals(&self, intervals: &[f32]) -> Option<TempoEstimate> {
        if intervals.is_empty() {
            return None;
        }

        let ordered = sorted(intervals);
        let q1 = percentile_sorted(&ordered, 25.0);
        let q3 = percentile_sorted(&ordered, 75.0);
        let iqr = q3 - q1;
        let (low, high) = (q1 - self.iqr_factor * iqr, q3 + self.iqr_factor * iqr);

        let mut surviving: Vec<f32> = intervals
            .iter()
            .copied()
            .filter(|&i| i >= low && i <= high)
            .collect();
        if surviving.is_empty() {
            surviving = intervals.to_vec();
        }

        let period = median(&surviving);
        if period <= 0.0 || !period.is_finite() {
            return None;
        }

        let relative_std = std_dev(&surviving) / period;
        let mut confidence = (1.0 - relative_std).max(0.0);
        if surviving.len() > self.bonus_min_intervals {
            confidence = (confidence * self.bonus_factor).min(1.0);
        }

        Some(TempoEstimate {
            bpm: 60.0 / period,
            confidence: confidence.clamp(0.0, 1.0),
            intervals_used: surviving.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_close_beats_scenario() {
        let beats = [0.0, 0.1, 0.5, 0.51, 1.0, 1.05, 1.5];
        let filtered = filter_close_beats(&beats, 0.2);
        assert!(filtered.len() < beats.len());
        assert_eq!(filtered, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_filter_close_beats_spacing_property() {
        let beats: Vec<f32> = (0..200).map(|i| i as f32 * 0.037 + (i % 7) as f32 * 0.011).collect();
        let filtered = filter_close_beats(&beats, 0.2);
        assert_eq!(filtered[0], beats[0]);
        assert!(filtered.windows(2).all(|w| w[1] - w[0] >= 0.2));
    }

    #[test]
    fn test_filter_close_beats_empty() {
        assert!(filter_close_beats(&[], 0.2).is_empty());
        assert_eq!(filter_close_beats(&[3.0], 0.2), vec![3.0]);
    }

    #[test]
    fn test_steady_grid() {
        let beats: Vec<f32> = (0..20).map(|i| i as f32 * 0.5).collect();
        let estimate = TempoEstimator::default().estimate(&beats).unwrap();
        assert!((estimate.bpm - 120.0).abs() < 1e-3);
        assert!((estimate.confidence - 1.0).abs() < 1e-6);
        assert_eq!(estimate.intervals_used, 19);
    }

    #[test]
    fn test_outlier_rejected() {
        let intervals = [0.5, 0.5, 0.5, 0.5, 0.5, 2.0];
        let estimate = TempoEstimator::default().estimate_from_intervals(&intervals).unwrap();
        assert!((estimate.bpm - 120.0).abs() < 1e-3);
        assert_eq!(estimate.intervals_used, 5);
    }

    #[test]
    fn test_jittered_confidence_in_range() {
        let intervals = [0.3, 0.9, 0.45, 1.4, 0.2, 0.6];
        let estimate = TempoEstimator::default().estimate_from_intervals(&intervals).unwrap();
        assert!((0.0..=1.0).contains(&estimate.confidence));
        assert!(estimate.confidence < 0.8);
    }

    #[test]
    fn test_bonus_capped() {
        let intervals = vec![0.5f32; 11];
        let estimate = TempoEstimator::default().estimate_from_intervals(&intervals).unwrap();
        assert_eq!(estimate.confidence, 1.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let estimator = TempoEstimator::default();
        assert!(estimator.estimate(&[1.0]).is_none());
        assert!(estimator.estimate_from_intervals(&[0.0, 0.0]).is_none());
    }
}
