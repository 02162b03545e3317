//! Peak detection utilities
//!
//! Local maxima in 1D signals, used on autocorrelation functions and
//! beat-tracking score curves.

/// Find strict interior local maxima at or above `min_height`
///
/// # Arguments
///
/// * `signal` - Signal to find peaks in
/// * `min_height` - Minimum peak value (absolute)
///
/// # Returns
///
/// Peak indices in ascending order. The first and last samples are never peaks.
///
/// # Example
///
/// ```
/// use cuepoint_dsp::features::period::peak_picking::find_peaks;
///
/// let signal = vec![0.0, 0.5, 1.0, 0.7, 0.3, 0.9, 0.2];
/// assert_eq!(find_peaks(&signal, 0.5), vec![2, 5]);
/// ```
pub fn find_peaks(signal: &[f32], min_height: f32) -> Vec<usize> {
    if signal.len() < 3 {
        return Vec::new();
    }

    let peaks: Vec<usize> = (1..signal.len() - 1)
        .filter(|&i| {
            signal[i] > signal[i - 1] && signal[i] > signal[i + 1] && signal[i] >= min_height
        })
        .collect();

    log::trace!(
        "Found {} peaks in signal of length {} (min height {:.4})",
        peaks.len(),
        signal.len(),
        min_height
    );

    peaks
}

/// Sub-sample offset of a peak from three samples around it
///
/// Fits a parabola through `(−1, left)`, `(0, center)`, `(1, right)` and returns the
/// vertex position, clamped to `[-0.5, 0.5]`. Returns 0 for a flat neighbourhood.
pub fn parabolic_offset(left: f32, center: f32, right: f32) -> f32 {
    let denom = left - 2.0 * center + right;
    if denom.abs() < 1e-12 || !denom.is_finite() {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
}
