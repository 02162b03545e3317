//! Chroma vector extraction
//!
//! Folds the power of every FFT bin at or above A0 (27.5 Hz) onto its nearest
//! equal-tempered pitch class (A4 = 440 Hz), then max-normalizes each frame.

use super::normalization::normalize_max;
use crate::features::spectrogram::Spectrogram;

/// Lowest frequency mapped to a pitch class (A0)
const CHROMA_FMIN: f32 = 27.5;

/// Reference tuning in Hz
const A4_HZ: f32 = 440.0;

/// Pitch class (0 = C, ..., 11 = B) of a frequency
pub fn pitch_class(frequency: f32) -> usize {
    let midi = 69.0 + 12.0 * (frequency / A4_HZ).log2();
    (midi.round() as i64).rem_euclid(12) as usize
}

/// Extract 12-element chroma vectors (one per frame)
///
/// # Arguments
///
/// * `spectrogram` - Magnitude spectrogram
///
/// # Returns
///
/// Vector of max-normalized 12-element chroma vectors, one per frame
pub fn extract_chroma(spectrogram: &Spectrogram) -> Vec<Vec<f32>> {
    let bin_classes: Vec<Option<usize>> = (0..spectrogram.n_bins())
        .map(|k| {
            let f = spectrogram.bin_frequency(k);
            (f >= CHROMA_FMIN).then(|| pitch_class(f))
        })
        .collect();

    log::debug!(
        "Extracting chroma: {} frames, {} bins",
        spectrogram.n_frames(),
        spectrogram.n_bins()
    );

    spectrogram
        .magnitudes
        .iter()
        .map(|frame| {
            let mut chroma = vec![0.0f32; 12];
            for (&m, class) in frame.iter().zip(&bin_classes) {
                if let Some(pc) = class {
                    chroma[*pc] += m * m;
                }
            }
            normalize_max(&mut chroma);
            chroma
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::spectrogram::compute_spectrogram;

    #[test]
    fn test_pitch_classes() {
        assert_eq!(pitch_class(440.0), 9); // A
        assert_eq!(pitch_class(261.63), 0); // C4
        assert_eq!(pitch_class(392.0), 7); // G4
    }

    #[test]
    fn test_a440_tone_peaks_at_a() {
        let sr = 22050;
        let samples: Vec<f32> = (0..sr)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr as f32).sin())
            .collect();
        let spec = compute_spectrogram(&samples, sr as u32, 4096, 1024).unwrap();
        let chroma = extract_chroma(&spec);
        let frame = &chroma[chroma.len() / 2];
        assert_eq!(frame[9], 1.0);
        assert!(frame.iter().enumerate().all(|(i, &c)| i == 9 || c < 1.0));
    }
}
