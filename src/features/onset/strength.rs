//! Onset-strength envelope
//!
//! Per-frame likelihood of a new sound event: the mean over mel bands of the
//! positive first difference of the log-power mel spectrogram. Frame 0 is 0.
//!
//! # Example
//!
//! ```
//! use cuepoint_dsp::features::onset::strength::onset_strength_envelope;
//!
//! let samples = vec![0.0f32; 22050];
//! let envelope = onset_strength_envelope(&samples, 22050, 2048, 512, 64)?;
//! assert!(envelope.iter().all(|&x| x == 0.0));
//! # Ok::<(), cuepoint_dsp::AnalysisError>(())
//! ```

use crate::error::AnalysisError;
use crate::features::mfcc::mel_spectrogram_db;
use crate::features::spectrogram::compute_spectrogram;

/// Onset strength from a mel dB spectrogram (one value per frame)
pub fn onset_strength(mel_db: &[Vec<f32>]) -> Vec<f32> {
    let mut envelope = Vec::with_capacity(mel_db.len());
    if mel_db.is_empty() {
        return envelope;
    }
    envelope.push(0.0);

    for pair in mel_db.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let bands = curr.len().max(1) as f32;
        let flux: f32 = curr
            .iter()
            .zip(prev)
            .map(|(&c, &p)| (c - p).max(0.0))
            .sum();
        envelope.push(flux / bands);
    }

    envelope
}

/// Compute the onset-strength envelope straight from audio
///
/// # Errors
///
/// Returns `AnalysisError` if the spectrogram cannot be computed
pub fn onset_strength_envelope(
    samples: &[f32],
    sample_rate: u32,
    frame_length: usize,
    hop_length: usize,
    n_mels: usize,
) -> Result<Vec<f32>, AnalysisError> {
    let spectrogram = compute_spectrogram(samples, sample_rate, frame_length, hop_length)?;
    let mel_db = mel_spectrogram_db(&spectrogram, n_mels);
    Ok(onset_strength(&mel_db))
}
