//! Energy flux onset detection
//!
//! Detects onsets by finding peaks in the frame-by-frame energy derivative.
//!
//! Algorithm:
//! 1. Divide audio into overlapping frames (frame_size, hop_size)
//! 2. Compute RMS energy per frame
//! 3. Compute energy derivative (flux): E_flux[n] = max(0, E[n] - E[n-1])
//! 4. Keep local maxima above a threshold relative to the largest flux
//!
//! # Reference
//!
//! Bello, J. P., Daudet, L., Abdallah, S., Duxbury, C., Davies, M., & Sandler, M. B. (2005).
//! A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// RMS energy of consecutive (uncentered) frames
pub fn frame_energies(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    if frame_size == 0 || hop_size == 0 || samples.len() < frame_size {
        return Vec::new();
    }
    let num_frames = (samples.len() - frame_size) / hop_size + 1;
    (0..num_frames)
        .map(|i| {
            let frame = &samples[i * hop_size..i * hop_size + frame_size];
            (frame.iter().map(|&x| x * x).sum::<f32>() / frame_size as f32).sqrt()
        })
        .collect()
}

/// Detect onsets using the energy flux method
///
/// # Arguments
///
/// * `samples` - Audio samples (mono, normalized to [-1.0, 1.0])
/// * `sample_rate` - Sample rate in Hz
/// * `frame_size` - Frame size for analysis (typically 2048)
/// * `hop_size` - Hop size between frames (typically 512)
/// * `threshold_db` - Threshold in dB relative to maximum flux (typically -20 to -30 dB)
///
/// # Returns
///
/// Onset times in seconds, ascending. Empty for silent or too-short audio.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the frame or hop size is zero or the
/// sample rate is zero
///
/// # Example
///
/// ```
/// use cuepoint_dsp::features::onset::energy_flux::detect_energy_flux_onsets;
///
/// let samples = vec![0.0f32; 44100];
/// let onsets = detect_energy_flux_onsets(&samples, 44100, 2048, 512, -20.0)?;
/// assert!(onsets.is_empty());
/// # Ok::<(), cuepoint_dsp::AnalysisError>(())
/// ```
pub fn detect_energy_flux_onsets(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    threshold_db: f32,
) -> Result<Vec<f32>, AnalysisError> {
    if frame_size == 0 || hop_size == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Frame size and hop size must be > 0 (frame={}, hop={})",
            frame_size, hop_size
        )));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
    }

    let energies = frame_energies(samples, frame_size, hop_size);
    if energies.len() < 3 {
        log::debug!("Too few frames for energy flux ({}), returning no onsets", energies.len());
        return Ok(Vec::new());
    }

    // flux[i] is the rise from frame i to frame i + 1
    let flux: Vec<f32> = energies.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect();

    let max_flux = flux.iter().copied().fold(0.0f32, f32::max);
    if max_flux <= EPSILON {
        log::debug!("All energy flux values are zero, no onsets detected");
        return Ok(Vec::new());
    }
    let threshold = max_flux * 10.0_f32.powf(threshold_db / 20.0);

    log::debug!(
        "Energy flux: {} frames, max={:.6}, threshold={:.6} ({:.1} dB)",
        energies.len(),
        max_flux,
        threshold,
        threshold_db
    );

    // >= on the right so a plateau reports its first frame
    let last = flux.len() - 1;
    let onsets: Vec<f32> = (0..flux.len())
        .filter(|&i| {
            let left_ok = i == 0 || flux[i] > flux[i - 1];
            let right_ok = i == last || flux[i] >= flux[i + 1];
            flux[i] > threshold && left_ok && right_ok
        })
        .map(|i| ((i + 1) * hop_size) as f32 / sample_rate as f32)
        .collect();

    log::debug!("Energy flux detected {} onsets", onsets.len());

    Ok(onsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four-on-the-floor kick pattern with exponential decay
    fn generate_kick_pattern(duration_seconds: f32, bpm: f32, sample_rate: f32, kick_ms: f32) -> Vec<f32> {
        let num_samples = (duration_seconds * sample_rate) as usize;
        let mut samples = vec![0.0f32; num_samples];
        let beat_interval = (60.0 / bpm * sample_rate) as usize;
        let kick_samples = (kick_ms / 1000.0 * sample_rate) as usize;

        let mut pos = 0;
        while pos < num_samples {
            let end = (pos + kick_samples).min(num_samples);
            for i in 0..(end - pos) {
                let t = i as f32 / kick_samples as f32;
                samples[pos + i] = 0.8 * (-t * 5.0).exp();
            }
            pos += beat_interval;
        }
        samples
    }

    #[test]
    fn test_energy_flux_step() {
        let mut samples = vec![0.0f32; 44100];
        for s in &mut samples[5000..] {
            *s = 0.5;
        }
        let onsets = detect_energy_flux_onsets(&samples, 44100, 2048, 512, -30.0).unwrap();

        assert!(!onsets.is_empty(), "Should detect the step");
        let step_time = 5000.0 / 44100.0;
        assert!((onsets[0] - step_time).abs() < 0.06, "onset at {}", onsets[0]);
    }

    #[test]
    fn test_energy_flux_kick_pattern_120_bpm() {
        let samples = generate_kick_pattern(4.0, 120.0, 44100.0, 150.0);
        let onsets = detect_energy_flux_onsets(&samples, 44100, 2048, 512, -20.0).unwrap();

        assert!(onsets.len() >= 6, "Expected most kicks, got {}", onsets.len());
        let intervals: Vec<f32> = onsets.windows(2).map(|w| w[1] - w[0]).collect();
        let mean = intervals.iter().sum::<f32>() / intervals.len() as f32;
        assert!((mean - 0.5).abs() < 0.05, "mean interval {}", mean);
    }

    #[test]
    fn test_energy_flux_silent_audio() {
        let onsets = detect_energy_flux_onsets(&vec![0.0f32; 44100], 44100, 2048, 512, -20.0).unwrap();
        assert!(onsets.is_empty());
    }

    #[test]
    fn test_energy_flux_too_short_audio() {
        let onsets = detect_energy_flux_onsets(&vec![0.5f32; 1000], 44100, 2048, 512, -20.0).unwrap();
        assert!(onsets.is_empty());
    }

    #[test]
    fn test_energy_flux_invalid_parameters() {
        let samples = vec![0.5f32; 44100];
        assert!(detect_energy_flux_onsets(&samples, 44100, 0, 512, -20.0).is_err());
        assert!(detect_energy_flux_onsets(&samples, 44100, 2048, 0, -20.0).is_err());
        assert!(detect_energy_flux_onsets(&samples, 0, 2048, 512, -20.0).is_err());
    }

    #[test]
    fn test_frame_energies_constant() {
        let energies = frame_energies(&vec![0.5f32; 4096], 1024, 512);
        assert_eq!(energies.len(), 7);
        assert!(energies.iter().all(|&e| (e - 0.5).abs() < 1e-6));
    }
}
