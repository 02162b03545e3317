//! Per-frame spectral descriptors
//!
//! RMS energy, spectral centroid, spectral contrast and zero-crossing rate.

use super::spectrogram::{pad_centered, Spectrogram};

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Octave bands above the lowest band for spectral contrast
pub const CONTRAST_BANDS: usize = 6;

/// Lower edge of the first contrast octave in Hz
const CONTRAST_FMIN: f32 = 200.0;

/// Fraction of a band's bins averaged for its peak and valley
const CONTRAST_QUANTILE: f32 = 0.02;

/// RMS energy of a frame computed from its magnitude spectrum
///
/// Uses Parseval's relation for a one-sided spectrum: the DC and Nyquist bins are
/// counted once, every other bin twice.
pub fn rms_from_magnitude(magnitude: &[f32], frame_length: usize) -> f32 {
    if magnitude.is_empty() || frame_length == 0 {
        return 0.0;
    }
    let mut sum: f32 = magnitude.iter().map(|&m| m * m).sum::<f32>() * 2.0;
    sum -= magnitude[0] * magnitude[0];
    if frame_length % 2 == 0 && magnitude.len() > 1 {
        let last = magnitude[magnitude.len() - 1];
        sum -= last * last;
    }
    (sum.max(0.0) / (frame_length * frame_length) as f32).sqrt()
}

/// Magnitude-weighted mean frequency of a frame in Hz (0 for silent frames)
pub fn spectral_centroid(magnitude: &[f32], frequencies: &[f32]) -> f32 {
    let total: f32 = magnitude.iter().sum();
    if total <= EPSILON {
        return 0.0;
    }
    magnitude
        .iter()
        .zip(frequencies)
        .map(|(&m, &f)| m * f)
        .sum::<f32>()
        / total
}

/// Bin ranges `[lo, hi)` for the contrast bands of a spectrogram
fn contrast_band_ranges(frequencies: &[f32]) -> Vec<(usize, usize)> {
    let mut edges = vec![0.0f32];
    edges.extend((0..=CONTRAST_BANDS).map(|k| CONTRAST_FMIN * 2f32.powi(k as i32)));

    let bin_at = |f: f32| frequencies.iter().position(|&x| x >= f).unwrap_or(frequencies.len());

    (0..=CONTRAST_BANDS)
        .map(|k| {
            let lo = bin_at(edges[k]);
            let hi = if k == CONTRAST_BANDS {
                frequencies.len()
            } else {
                bin_at(edges[k + 1])
            };
            (lo, hi.max(lo))
        })
        .collect()
}

/// Peak-minus-valley contrast of one band in dB
fn band_contrast(band: &mut [f32]) -> f32 {
    if band.is_empty() {
        return 0.0;
    }
    let n = band.len();
    let k = ((CONTRAST_QUANTILE * n as f32).round() as usize).clamp(1, n);
    let cmp = |a: &f32, b: &f32| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);

    band.select_nth_unstable_by(k - 1, cmp);
    let valley = band[..k].iter().sum::<f32>() / k as f32;

    band.select_nth_unstable_by(n - k, cmp);
    let peak = band[n - k..].iter().sum::<f32>() / k as f32;

    10.0 * peak.max(EPSILON).log10() - 10.0 * valley.max(EPSILON).log10()
}

/// Spectral contrast per frame (n_frames × `CONTRAST_BANDS + 1`)
pub fn spectral_contrast(spectrogram: &Spectrogram) -> Vec<Vec<f32>> {
    let ranges = contrast_band_ranges(&spectrogram.bin_frequencies());
    let mut band = Vec::with_capacity(spectrogram.n_bins());

    spectrogram
        .magnitudes
        .iter()
        .map(|frame| {
            ranges
                .iter()
                .map(|&(lo, hi)| {
                    band.clear();
                    band.extend_from_slice(&frame[lo..hi]);
                    band_contrast(&mut band)
                })
                .collect()
        })
        .collect()
}

/// Fraction of adjacent sample pairs that change sign
pub fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / frame.len() as f32
}

/// Zero-crossing rate per centered frame (same framing as the spectrogram)
pub fn zero_crossing_rates(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    if hop_length == 0 || frame_length == 0 {
        return Vec::new();
    }
    let padded = pad_centered(samples, frame_length);
    let n_frames = super::spectrogram::frame_count(samples.len(), hop_length);
    (0..n_frames)
        .map(|i| {
            let start = i * hop_length;
            zero_crossing_rate(&padded[start..start + frame_length])
        })
        .collect()
}
