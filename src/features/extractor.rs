//! Frame-level feature extraction for structure analysis
//!
//! One STFT pass feeds every spectral feature; zero-crossing rate is computed on
//! the same centered frames so all series share the frame→time mapping.

use super::chroma::extractor::extract_chroma;
use super::mfcc::{mel_spectrogram_db, mfcc_from_mel_db};
use super::onset::strength::onset_strength;
use super::spectral::{rms_from_magnitude, spectral_centroid, spectral_contrast, zero_crossing_rates};
use super::spectrogram::compute_spectrogram;
use crate::config::StructureConfig;
use crate::error::AnalysisError;

/// Frame-indexed features of one track
///
/// Scalar series hold one value per frame; matrices hold one row per frame.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// RMS energy per frame
    pub energy: Vec<f32>,

    /// Spectral centroid per frame in Hz
    pub spectral_centroid: Vec<f32>,

    /// Cepstral coefficients per frame (`n_mfcc` each)
    pub mfcc: Vec<Vec<f32>>,

    /// Max-normalized chroma per frame (12 each)
    pub chroma: Vec<Vec<f32>>,

    /// Spectral contrast per frame (7 bands each)
    pub spectral_contrast: Vec<Vec<f32>>,

    /// Zero-crossing rate per frame
    pub zcr: Vec<f32>,

    /// Onset strength per frame
    pub onset_strength: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Hop between frames in samples
    pub hop_length: usize,

    /// Analysis frame length in samples
    pub frame_length: usize,
}

impl FeatureSet {
    /// Feature names in extraction order
    pub const FEATURE_NAMES: [&'static str; 7] = [
        "energy",
        "spectral_centroid",
        "mfcc",
        "chroma",
        "spectral_contrast",
        "zcr",
        "onset_strength",
    ];

    /// Feature names as owned strings, for result metadata
    pub fn feature_names(&self) -> Vec<String> {
        Self::FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    /// Number of frames
    pub fn n_frames(&self) -> usize {
        self.energy.len()
    }

    /// Start time of frame `frame` in seconds
    pub fn frame_to_time(&self, frame: usize) -> f32 {
        frame as f32 * self.hop_length as f32 / self.sample_rate as f32
    }

    /// Index of the frame containing time `seconds` (floor, not clamped)
    pub fn time_to_frame(&self, seconds: f32) -> usize {
        (seconds.max(0.0) * self.sample_rate as f32 / self.hop_length as f32).floor() as usize
    }
}

/// Computes a [`FeatureSet`] from mono audio
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    hop_length: usize,
    frame_length: usize,
    n_mels: usize,
    n_mfcc: usize,
}

impl FeatureExtractor {
    /// Create an extractor with 128 mel bands and 13 coefficients
    pub fn new(hop_length: usize, frame_length: usize) -> Self {
        Self {
            hop_length,
            frame_length,
            n_mels: 128,
            n_mfcc: 13,
        }
    }

    /// Create an extractor from structure settings
    pub fn from_config(config: &StructureConfig) -> Self {
        Self {
            hop_length: config.hop_length,
            frame_length: config.frame_length,
            n_mels: config.n_mels,
            n_mfcc: config.n_mfcc,
        }
    }

    /// Extract all features
    ///
    /// # Arguments
    ///
    /// * `samples` - Mono audio samples
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::FeatureExtraction` if the audio is shorter than one
    /// frame or the framing is invalid, `AnalysisError::NumericalError` for
    /// non-finite samples. Silent audio is not an error.
    ///
    /// # Example
    ///
    /// ```
    /// use cuepoint_dsp::features::extractor::FeatureExtractor;
    ///
    /// let features = FeatureExtractor::new(512, 2048).extract(&vec![0.0f32; 44100], 44100)?;
    /// assert_eq!(features.n_frames(), 1 + 44100 / 512);
    /// assert!(features.energy.iter().all(|&e| e == 0.0));
    /// # Ok::<(), cuepoint_dsp::AnalysisError>(())
    /// ```
    pub fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<FeatureSet, AnalysisError> {
        let spectrogram = compute_spectrogram(samples, sample_rate, self.frame_length, self.hop_length)?;
        let frequencies = spectrogram.bin_frequencies();

        let energy = spectrogram
            .magnitudes
            .iter()
            .map(|frame| rms_from_magnitude(frame, self.frame_length))
            .collect();
        let centroid = spectrogram
            .magnitudes
            .iter()
            .map(|frame| spectral_centroid(frame, &frequencies))
            .collect();

        let mel_db = mel_spectrogram_db(&spectrogram, self.n_mels);
        let mfcc = mfcc_from_mel_db(&mel_db, self.n_mfcc);
        let onset = onset_strength(&mel_db);

        let features = FeatureSet {
            energy,
            spectral_centroid: centroid,
            mfcc,
            chroma: extract_chroma(&spectrogram),
            spectral_contrast: spectral_contrast(&spectrogram),
            zcr: zero_crossing_rates(samples, self.frame_length, self.hop_length),
            onset_strength: onset,
            sample_rate,
            hop_length: self.hop_length,
            frame_length: self.frame_length,
        };

        log::debug!(
            "Extracted {} features over {} frames ({} Hz, hop={})",
            FeatureSet::FEATURE_NAMES.len(),
            features.n_frames(),
            sample_rate,
            self.hop_length
        );

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32, amplitude: f32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_all_series_share_frame_count() {
        let features = FeatureExtractor::new(512, 2048)
            .extract(&sine(440.0, 22050, 2.0, 0.5), 22050)
            .unwrap();
        let n = features.n_frames();
        assert_eq!(features.spectral_centroid.len(), n);
        assert_eq!(features.mfcc.len(), n);
        assert_eq!(features.chroma.len(), n);
        assert_eq!(features.spectral_contrast.len(), n);
        assert_eq!(features.zcr.len(), n);
        assert_eq!(features.onset_strength.len(), n);
        assert_eq!(features.mfcc[0].len(), 13);
    }

    #[test]
    fn test_tone_features() {
        let features = FeatureExtractor::new(512, 2048)
            .extract(&sine(440.0, 22050, 2.0, 0.5), 22050)
            .unwrap();
        let mid = features.n_frames() / 2;
        assert!((features.spectral_centroid[mid] - 440.0).abs() < 50.0);
        // A = pitch class 9
        assert!((features.chroma[mid][9] - 1.0).abs() < 1e-6);
        assert!(features.energy[mid] > 0.1);
    }

    #[test]
    fn test_silence_does_not_fail() {
        let features = FeatureExtractor::new(512, 2048).extract(&vec![0.0; 44100], 44100).unwrap();
        assert!(features.spectral_centroid.iter().all(|&c| c == 0.0));
        assert!(features.onset_strength.iter().all(|&o| o == 0.0));
        assert!(features.mfcc.iter().flatten().all(|c| c.is_finite()));
    }

    #[test]
    fn test_too_short_fails() {
        let result = FeatureExtractor::new(512, 2048).extract(&[0.0; 100], 44100);
        assert!(matches!(result, Err(AnalysisError::FeatureExtraction(_))));
    }

    #[test]
    fn test_frame_time_mapping() {
        let features = FeatureExtractor::new(512, 2048).extract(&vec![0.0; 22050], 22050).unwrap();
        assert!((features.frame_to_time(43) - 43.0 * 512.0 / 22050.0).abs() < 1e-6);
        assert_eq!(features.time_to_frame(features.frame_to_time(10) + 1e-4), 10);
        assert_eq!(features.feature_names().len(), 7);
    }
}
