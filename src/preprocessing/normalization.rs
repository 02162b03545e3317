//! Peak normalization
//!
//! Beat trackers work on peak-normalized mono audio so their thresholds do not
//! depend on mastering level.

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Scale samples so the absolute peak is 1.0
///
/// Silent (or near-silent) input is left untouched.
///
/// # Returns
///
/// The gain that was applied (1.0 for silent input)
///
/// # Example
///
/// ```
/// use cuepoint_dsp::preprocessing::normalization::normalize_peak;
///
/// let mut samples = vec![0.25, -0.5, 0.1];
/// let gain = normalize_peak(&mut samples);
/// assert_eq!(gain, 2.0);
/// assert_eq!(samples, vec![0.5, -1.0, 0.2]);
/// ```
pub fn normalize_peak(samples: &mut [f32]) -> f32 {
    let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);

    if peak <= EPSILON {
        log::debug!("Audio is silent or extremely quiet, skipping peak normalization");
        return 1.0;
    }

    let gain = 1.0 / peak;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }

    log::debug!(
        "Peak normalization: peak={:.2} dB, gain={:.2} dB",
        20.0 * peak.log10(),
        20.0 * gain.log10()
    );

    gain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_normalization() {
        let mut samples: Vec<f32> = (0..44100)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();

        normalize_peak(&mut samples);

        let new_peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
        assert!((new_peak - 1.0).abs() < 1e-4, "peak was {}", new_peak);
    }

    #[test]
    fn test_silent_audio() {
        let mut samples = vec![0.0f32; 1024];
        let gain = normalize_peak(&mut samples);
        assert_eq!(gain, 1.0);
        assert!(samples.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_empty_samples() {
        let mut samples: Vec<f32> = Vec::new();
        assert_eq!(normalize_peak(&mut samples), 1.0);
    }
}
