//! Dynamic-programming beat tracking
//!
//! Places beats on an onset strength envelope so that they fall on strong onsets
//! while keeping inter-beat intervals close to a global tempo period.
//!
//! # Algorithm
//!
//! 1. Onset strength envelope from the mel spectrogram
//! 2. Beat period from the envelope autocorrelation (tempo prior around 120 BPM)
//! 3. Local score: envelope normalized by its standard deviation, smoothed with a
//!    Gaussian of width `period / 32`
//! 4. Cumulative score: `C[t] = L[t] + max_τ (C[t - τ] - α · ln(τ / p)²)` for
//!    `τ ∈ [p/2, 2p]`, with back-links to the best predecessor
//! 5. Start from the last strong cumulative-score peak and follow back-links
//! 6. Trim weak beats from both ends, refine each beat with parabolic interpolation
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use super::BeatTracker;
use crate::error::AnalysisError;
use crate::features::onset::strength::onset_strength_envelope;
use crate::features::period::autocorrelation::estimate_beat_period;
use crate::features::period::peak_picking::{find_peaks, parabolic_offset};

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Penalty weight for deviating from the tempo period
pub const DEFAULT_TIGHTNESS: f32 = 100.0;

/// Mel bands used for the onset envelope
const ONSET_MELS: usize = 128;

/// Dynamic-programming beat tracker
#[derive(Debug, Clone)]
pub struct DynamicProgrammingTracker {
    frame_size: usize,
    hop_size: usize,
    min_bpm: f32,
    max_bpm: f32,
    tightness: f32,
}

impl DynamicProgrammingTracker {
    /// Create a tracker searching tempo periods inside `[min_bpm, max_bpm]`
    pub fn new(frame_size: usize, hop_size: usize, min_bpm: f32, max_bpm: f32) -> Self {
        Self {
            frame_size,
            hop_size,
            min_bpm,
            max_bpm,
            tightness: DEFAULT_TIGHTNESS,
        }
    }

    /// Override the tempo-deviation penalty
    pub fn with_tightness(mut self, tightness: f32) -> Self {
        self.tightness = tightness;
        self
    }

    /// Track beats on a precomputed onset envelope
    ///
    /// # Arguments
    ///
    /// * `envelope` - Onset strength, one value per hop
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    ///
    /// Beat times in seconds, ascending
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` if the envelope carries no onsets or
    /// no tempo period can be found in the BPM range
    pub fn track_envelope(&self, envelope: &[f32], sample_rate: u32) -> Result<Vec<f32>, AnalysisError> {
        let period = estimate_beat_period(
            envelope,
            sample_rate,
            self.hop_size,
            self.min_bpm,
            self.max_bpm,
        )?
        .ok_or_else(|| {
            AnalysisError::ProcessingError("No tempo period found in onset envelope".to_string())
        })?;

        let local = local_score(envelope, period).ok_or_else(|| {
            AnalysisError::ProcessingError("Onset envelope is flat".to_string())
        })?;

        let (cumulative, backlinks) = cumulative_score(&local, period, self.tightness);
        let last = last_beat(&cumulative);

        let mut frames = vec![last];
        let mut current = last;
        while let Some(previous) = backlinks[current] {
            frames.push(previous);
            current = previous;
        }
        frames.reverse();

        let frames = trim_weak_beats(&frames, &local);

        log::debug!(
            "DP beat tracker: period {:.2} frames, {} beats after trimming",
            period,
            frames.len()
        );

        let frame_seconds = self.hop_size as f32 / sample_rate as f32;
        let times = frames
            .iter()
            .map(|&f| {
                let offset = if f > 0 && f + 1 < local.len() {
                    parabolic_offset(local[f - 1], local[f], local[f + 1])
                } else {
                    0.0
                };
                ((f as f32 + offset) * frame_seconds).max(0.0)
            })
            .collect();

        Ok(times)
    }
}

impl BeatTracker for DynamicProgrammingTracker {
    fn name(&self) -> &str {
        "dynamic_programming"
    }

    fn track_beats(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, AnalysisError> {
        let envelope = onset_strength_envelope(
            samples,
            sample_rate,
            self.frame_size,
            self.hop_size,
            ONSET_MELS,
        )?;
        self.track_envelope(&envelope, sample_rate)
    }
}

/// Envelope normalized by its standard deviation and smoothed by a Gaussian
///
/// Returns `None` for a constant envelope.
fn local_score(envelope: &[f32], period: f32) -> Option<Vec<f32>> {
    let n = envelope.len() as f32;
    let mean = envelope.iter().sum::<f32>() / n;
    let std = (envelope.iter().map(|&x| (x - mean) * (x - mean)).sum::<f32>() / n).sqrt();
    if std <= EPSILON || !std.is_finite() {
        return None;
    }

    let half = period.round().max(1.0) as usize;
    let kernel: Vec<f32> = (0..=2 * half)
        .map(|j| {
            let x = (j as f32 - half as f32) * 32.0 / period;
            (-0.5 * x * x).exp()
        })
        .collect();

    // Same-size convolution; kernel is symmetric
    let len = envelope.len();
    let score: Vec<f32> = (0..len)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(len - 1);
            (lo..=hi)
                .map(|j| envelope[j] / std * kernel[j + half - i])
                .sum::<f32>()
        })
        .collect();

    Some(score)
}

/// Cumulative beat score and back-links for every frame
fn cumulative_score(local: &[f32], period: f32, tightness: f32) -> (Vec<f32>, Vec<Option<usize>>) {
    let min_lag = ((period / 2.0).round() as usize).max(1);
    let max_lag = ((2.0 * period).round() as usize).max(min_lag);

    let penalties: Vec<f32> = (min_lag..=max_lag)
        .map(|lag| {
            let ratio = (lag as f32 / period).ln();
            -tightness * ratio * ratio
        })
        .collect();

    let mut cumulative = vec![0.0f32; local.len()];
    let mut backlinks = vec![None; local.len()];

    for i in 0..local.len() {
        let mut best: Option<(usize, f32)> = None;
        for (lag, &penalty) in (min_lag..=max_lag).zip(&penalties) {
            if lag > i {
                break;
            }
            let score = cumulative[i - lag] + penalty;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i - lag, score));
            }
        }

        match best {
            Some((previous, score)) if score > 0.0 => {
                cumulative[i] = local[i] + score;
                backlinks[i] = Some(previous);
            }
            _ => cumulative[i] = local[i],
        }
    }

    (cumulative, backlinks)
}

/// Last cumulative-score peak above half the median peak height
fn last_beat(cumulative: &[f32]) -> usize {
    let argmax = || {
        cumulative
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    };

    let peaks = find_peaks(cumulative, f32::NEG_INFINITY);
    if peaks.is_empty() {
        return argmax();
    }

    let mut heights: Vec<f32> = peaks.iter().map(|&p| cumulative[p]).collect();
    heights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = if heights.len() % 2 == 0 {
        0.5 * (heights[heights.len() / 2 - 1] + heights[heights.len() / 2])
    } else {
        heights[heights.len() / 2]
    };
    let threshold = 0.5 * median;

    peaks
        .iter()
        .rev()
        .copied()
        .find(|&p| cumulative[p] >= threshold)
        .unwrap_or_else(argmax)
}

/// Drop leading and trailing beats whose local score is below half the beats' RMS
fn trim_weak_beats(frames: &[usize], local: &[f32]) -> Vec<usize> {
    if frames.is_empty() {
        return Vec::new();
    }
    let rms = (frames.iter().map(|&f| local[f] * local[f]).sum::<f32>() / frames.len() as f32).sqrt();
    let threshold = 0.5 * rms;

    let start = frames.iter().position(|&f| local[f] >= threshold);
    let end = frames.iter().rposition(|&f| local[f] >= threshold);
    match (start, end) {
        (Some(s), Some(e)) => frames[s..=e].to_vec(),
        _ => Vec::new(),
    }
}
