//! Mel spectrogram and cepstral coefficients
//!
//! # Algorithm
//!
//! 1. Power spectrum `|X|²` per frame
//! 2. Triangular HTK-mel filterbank (area-normalized), stored sparsely
//! 3. Power to dB with an 80 dB floor below the global maximum
//! 4. Orthonormal DCT-II over the mel bands, first `n_mfcc` coefficients kept

use super::spectrogram::Spectrogram;

/// Floor applied before taking logarithms
const POWER_FLOOR: f32 = 1e-10;

/// Dynamic range kept by [`power_to_db`]
pub const TOP_DB: f32 = 80.0;

/// Convert Hz to mel (HTK formula)
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert mel to Hz (HTK formula)
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// One triangular filter: weights for bins `start..start + weights.len()`
#[derive(Debug, Clone)]
struct MelFilter {
    start: usize,
    weights: Vec<f32>,
}

/// Sparse triangular mel filterbank
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<MelFilter>,
    n_bins: usize,
}

impl MelFilterbank {
    /// Build `n_mels` filters spanning `[fmin, fmax]` Hz for an FFT of `frame_length`
    pub fn new(n_mels: usize, frame_length: usize, sample_rate: u32, fmin: f32, fmax: f32) -> Self {
        let n_bins = frame_length / 2 + 1;
        let bin_hz = sample_rate as f32 / frame_length as f32;

        let mel_min = hz_to_mel(fmin);
        let mel_max = hz_to_mel(fmax);
        let hz_points: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
            .collect();

        let filters = (0..n_mels)
            .map(|j| {
                let (lower, center, upper) = (hz_points[j], hz_points[j + 1], hz_points[j + 2]);
                let norm = 2.0 / (upper - lower).max(POWER_FLOOR);

                let weights: Vec<(usize, f32)> = (0..n_bins)
                    .filter_map(|k| {
                        let f = k as f32 * bin_hz;
                        let w = if f > lower && f <= center {
                            (f - lower) / (center - lower)
                        } else if f > center && f < upper {
                            (upper - f) / (upper - center)
                        } else {
                            0.0
                        };
                        (w > 0.0).then_some((k, w * norm))
                    })
                    .collect();

                match (weights.first(), weights.last()) {
                    (Some(&(start, _)), Some(&(end, _))) => {
                        let mut dense = vec![0.0f32; end - start + 1];
                        for (k, w) in weights {
                            dense[k - start] = w;
                        }
                        MelFilter { start, weights: dense }
                    }
                    _ => MelFilter { start: 0, weights: Vec::new() },
                }
            })
            .collect();

        Self { filters, n_bins }
    }

    /// Number of mel bands
    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Apply the filterbank to one power spectrum
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        debug_assert_eq!(power.len(), self.n_bins);
        self.filters
            .iter()
            .map(|f| {
                power[f.start..]
                    .iter()
                    .zip(&f.weights)
                    .map(|(&p, &w)| p * w)
                    .sum()
            })
            .collect()
    }
}

/// Convert power values to dB in place, flooring at `max_db - top_db`
pub fn power_to_db(frames: &mut [Vec<f32>], top_db: f32) {
    let mut max_db = f32::NEG_INFINITY;
    for value in frames.iter_mut().flatten() {
        *value = 10.0 * value.max(POWER_FLOOR).log10();
        max_db = max_db.max(*value);
    }
    let floor = max_db - top_db;
    for value in frames.iter_mut().flatten() {
        *value = value.max(floor);
    }
}

/// Log-power mel spectrogram in dB (n_frames × n_mels)
pub fn mel_spectrogram_db(spectrogram: &Spectrogram, n_mels: usize) -> Vec<Vec<f32>> {
    let bank = MelFilterbank::new(
        n_mels,
        spectrogram.frame_length,
        spectrogram.sample_rate,
        0.0,
        spectrogram.sample_rate as f32 / 2.0,
    );

    let mut power = Vec::with_capacity(spectrogram.n_bins());
    let mut mel: Vec<Vec<f32>> = spectrogram
        .magnitudes
        .iter()
        .map(|frame| {
            power.clear();
            power.extend(frame.iter().map(|&m| m * m));
            bank.apply(&power)
        })
        .collect();

    power_to_db(&mut mel, TOP_DB);
    mel
}

/// Orthonormal DCT-II basis (n_out × n_in)
fn dct_basis(n_out: usize, n_in: usize) -> Vec<Vec<f32>> {
    let n = n_in as f32;
    (0..n_out)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_in)
                .map(|i| {
                    scale
                        * (std::f32::consts::PI * k as f32 * (2 * i + 1) as f32 / (2.0 * n)).cos()
                })
                .collect()
        })
        .collect()
}

/// Cepstral coefficients from a mel dB spectrogram (n_frames × n_mfcc)
pub fn mfcc_from_mel_db(mel_db: &[Vec<f32>], n_mfcc: usize) -> Vec<Vec<f32>> {
    let n_mels = mel_db.first().map(Vec::len).unwrap_or(0);
    if n_mels == 0 {
        return vec![Vec::new(); mel_db.len()];
    }
    let basis = dct_basis(n_mfcc.min(n_mels), n_mels);

    mel_db
        .iter()
        .map(|frame| {
            basis
                .iter()
                .map(|row| row.iter().zip(frame).map(|(&b, &x)| b * x).sum())
                .collect()
        })
        .collect()
}
