//! Autocorrelation-based beat period estimation
//!
//! Finds periodicity in an onset strength envelope using FFT-accelerated
//! autocorrelation.
//!
//! # Algorithm
//!
//! 1. Remove the envelope mean
//! 2. Compute autocorrelation using FFT acceleration: `ACF = IFFT(|FFT(signal)|²)`
//! 3. Weight lags inside the BPM range by a log-normal tempo prior centered on 120 BPM
//! 4. Take the best lag and refine it with parabolic interpolation
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use super::peak_picking::parabolic_offset;
use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Center of the tempo prior in BPM
const PRIOR_BPM: f32 = 120.0;

/// Width of the tempo prior in octaves
const PRIOR_OCTAVES: f32 = 1.0;

/// Compute the autocorrelation of a signal using FFT acceleration
///
/// Uses the identity: ACF = IFFT(|FFT(signal)|²), with zero-padding to avoid
/// circular wrap-around.
///
/// # Arguments
///
/// * `signal` - Input signal
///
/// # Returns
///
/// Unnormalized autocorrelation for lags `0..signal.len()`
///
/// # Example
///
/// ```
/// use cuepoint_dsp::features::period::autocorrelation::autocorrelate;
///
/// let acf = autocorrelate(&[1.0, 0.0, 1.0, 0.0]);
/// assert!((acf[0] - 2.0).abs() < 1e-5);
/// assert!((acf[2] - 1.0).abs() < 1e-5);
/// ```
pub fn autocorrelate(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    // FFT size: next power of 2 >= 2*n (for zero-padding)
    let fft_size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for x in &mut buffer {
        *x = Complex::new(x.norm_sqr(), 0.0);
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    buffer[..n].iter().map(|x| x.re * scale).collect()
}

/// Estimate the dominant beat period of an onset envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength envelope (one value per frame)
/// * `sample_rate` - Sample rate in Hz
/// * `hop_size` - Hop size of the envelope in samples
/// * `min_bpm` - Minimum BPM to consider
/// * `max_bpm` - Maximum BPM to consider
///
/// # Returns
///
/// Beat period in frames (fractional), or `None` if the envelope is too short or
/// has no periodicity in the BPM range
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate or hop size, or an
/// invalid BPM range
pub fn estimate_beat_period(
    envelope: &[f32],
    sample_rate: u32,
    hop_size: usize,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<Option<f32>, AnalysisError> {
    if sample_rate == 0 || hop_size == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid sample rate or hop size: {} Hz, hop={}",
            sample_rate, hop_size
        )));
    }
    if min_bpm <= 0.0 || max_bpm <= min_bpm {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            min_bpm, max_bpm
        )));
    }

    let frame_rate = sample_rate as f32 / hop_size as f32;
    let lag_min = ((60.0 * frame_rate / max_bpm).ceil() as usize).max(1);
    let lag_max = (60.0 * frame_rate / min_bpm).floor() as usize;

    if lag_min >= lag_max || lag_max + 1 >= envelope.len() {
        log::debug!(
            "Envelope of {} frames too short for lag range [{}, {}]",
            envelope.len(),
            lag_min,
            lag_max
        );
        return Ok(None);
    }

    let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
    let centered: Vec<f32> = envelope.iter().map(|&x| x - mean).collect();
    let acf = autocorrelate(&centered);

    let weighted: Vec<f32> = acf
        .iter()
        .enumerate()
        .map(|(lag, &value)| {
            if lag == 0 {
                return 0.0;
            }
            let bpm = 60.0 * frame_rate / lag as f32;
            let octaves = (bpm / PRIOR_BPM).log2() / PRIOR_OCTAVES;
            value * (-0.5 * octaves * octaves).exp()
        })
        .collect();

    let mut best_lag = lag_min;
    for lag in lag_min..=lag_max {
        if weighted[lag] > weighted[best_lag] {
            best_lag = lag;
        }
    }

    if weighted[best_lag] <= 0.0 {
        log::debug!("No positive autocorrelation in lag range [{}, {}]", lag_min, lag_max);
        return Ok(None);
    }

    let offset = parabolic_offset(
        weighted[best_lag - 1],
        weighted[best_lag],
        weighted[best_lag + 1],
    );
    let period = best_lag as f32 + offset;

    log::debug!(
        "Beat period: lag {} refined to {:.3} frames ({:.2} BPM)",
        best_lag,
        period,
        60.0 * frame_rate / period
    );

    Ok(Some(period))
}
