//! Short-time Fourier transform
//!
//! Centered framing: the signal is zero-padded by `frame_length / 2` on both sides,
//! so frame `i` is centered on sample `i * hop_length` and maps to time
//! `i * hop_length / sample_rate`.

use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Magnitude spectrogram (n_frames × n_bins)
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// One magnitude spectrum per frame, `frame_length / 2 + 1` bins each
    pub magnitudes: Vec<Vec<f32>>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// FFT size in samples
    pub frame_length: usize,

    /// Hop between frames in samples
    pub hop_length: usize,
}

impl Spectrogram {
    /// Number of frames
    pub fn n_frames(&self) -> usize {
        self.magnitudes.len()
    }

    /// Number of frequency bins per frame
    pub fn n_bins(&self) -> usize {
        self.frame_length / 2 + 1
    }

    /// Center frequency of bin `k` in Hz
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.sample_rate as f32 / self.frame_length as f32
    }

    /// Center frequencies of all bins in Hz
    pub fn bin_frequencies(&self) -> Vec<f32> {
        (0..self.n_bins()).map(|k| self.bin_frequency(k)).collect()
    }
}

/// Number of centered frames for a signal of `len` samples
pub fn frame_count(len: usize, hop_length: usize) -> usize {
    1 + len / hop_length
}

/// Zero-pad a signal by half a frame on both sides
pub fn pad_centered(samples: &[f32], frame_length: usize) -> Vec<f32> {
    let pad = frame_length / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);
    padded
}

/// Periodic Hann window
pub fn hann_window(length: usize) -> Vec<f32> {
    (0..length)
        .map(|n| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * n as f32 / length as f32).cos())
        .collect()
}

/// Check framing parameters against a signal
///
/// # Errors
///
/// Returns `AnalysisError::FeatureExtraction` if the signal is shorter than one frame
/// or the framing parameters are zero, `AnalysisError::NumericalError` for non-finite
/// samples.
pub fn validate_framing(
    samples: &[f32],
    sample_rate: u32,
    frame_length: usize,
    hop_length: usize,
) -> Result<(), AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
    }
    if frame_length == 0 || hop_length == 0 {
        return Err(AnalysisError::FeatureExtraction(format!(
            "Invalid framing: frame_length={}, hop_length={}",
            frame_length, hop_length
        )));
    }
    if samples.len() < frame_length {
        return Err(AnalysisError::FeatureExtraction(format!(
            "Audio too short for one frame: {} samples < frame length {}",
            samples.len(),
            frame_length
        )));
    }
    if samples.iter().any(|x| !x.is_finite()) {
        return Err(AnalysisError::NumericalError(
            "Audio contains non-finite samples".to_string(),
        ));
    }
    Ok(())
}

/// Compute a centered magnitude spectrogram with a periodic Hann window
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `frame_length` - FFT size (typically 2048)
/// * `hop_length` - Hop size (typically 512)
///
/// # Errors
///
/// See [`validate_framing`].
///
/// # Example
///
/// ```
/// use cuepoint_dsp::features::spectrogram::compute_spectrogram;
///
/// let samples = vec![0.0f32; 22050];
/// let spec = compute_spectrogram(&samples, 22050, 2048, 512)?;
/// assert_eq!(spec.n_frames(), 1 + 22050 / 512);
/// assert_eq!(spec.n_bins(), 1025);
/// # Ok::<(), cuepoint_dsp::AnalysisError>(())
/// ```
pub fn compute_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    frame_length: usize,
    hop_length: usize,
) -> Result<Spectrogram, AnalysisError> {
    validate_framing(samples, sample_rate, frame_length, hop_length)?;

    let n_frames = frame_count(samples.len(), hop_length);
    let n_bins = frame_length / 2 + 1;

    log::debug!(
        "Computing STFT: {} samples, frame={}, hop={}, {} frames",
        samples.len(),
        frame_length,
        hop_length,
        n_frames
    );

    let padded = pad_centered(samples, frame_length);
    let window = hann_window(frame_length);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_length);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_length];
    let mut scratch = vec![Complex::new(0.0f32, 0.0); fft.get_inplace_scratch_len()];

    let mut magnitudes = Vec::with_capacity(n_frames);
    for i in 0..n_frames {
        let start = i * hop_length;
        let frame = &padded[start..start + frame_length];

        for ((slot, &s), &w) in buffer.iter_mut().zip(frame).zip(&window) {
            *slot = Complex::new(s * w, 0.0);
        }
        fft.process_with_scratch(&mut buffer, &mut scratch);

        magnitudes.push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
    }

    Ok(Spectrogram {
        magnitudes,
        sample_rate,
        frame_length,
        hop_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_sine_peak_bin() {
        let spec = compute_spectrogram(&sine(1000.0, 22050, 1.0), 22050, 2048, 512).unwrap();
        let mid = &spec.magnitudes[spec.n_frames() / 2];
        let (peak_bin, _) = mid
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (k, &m)| if m > best.1 { (k, m) } else { best });

        let peak_freq = spec.bin_frequency(peak_bin);
        assert!((peak_freq - 1000.0).abs() < spec.bin_frequency(1), "peak at {} Hz", peak_freq);
    }

    #[test]
    fn test_too_short_fails() {
        let result = compute_spectrogram(&[0.0; 1000], 44100, 2048, 512);
        assert!(matches!(result, Err(AnalysisError::FeatureExtraction(_))));
    }

    #[test]
    fn test_zero_hop_fails() {
        let result = compute_spectrogram(&[0.0; 4096], 44100, 2048, 0);
        assert!(matches!(result, Err(AnalysisError::FeatureExtraction(_))));
    }

    #[test]
    fn test_non_finite_fails() {
        let mut samples = vec![0.0f32; 4096];
        samples[100] = f32::NAN;
        let result = compute_spectrogram(&samples, 44100, 2048, 512);
        assert!(matches!(result, Err(AnalysisError::NumericalError(_))));
    }

    #[test]
    fn test_hann_window_endpoints() {
        let w = hann_window(8);
        assert!(w[0].abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
    }
}
