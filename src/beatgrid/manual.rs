//! Manual beatgrid input: tap tempo and grid adjustment

use crate::analysis::result::BeatgridResult;
use crate::error::AnalysisError;

/// Upper end of a synthesized grid when the original grid is shorter (5 minutes)
pub const ADJUST_SAFETY_CAP_SECONDS: f32 = 300.0;

/// Tempo from manual taps: 60 / mean tap interval
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for fewer than 2 taps, non-finite taps, or
/// a non-positive mean interval
///
/// # Example
///
/// ```
/// use cuepoint_dsp::beatgrid::manual::tap_tempo;
///
/// let bpm = tap_tempo(&[0.0, 0.5, 1.0, 1.5, 2.0])?;
/// assert!((bpm - 120.0).abs() < 0.01);
/// # Ok::<(), cuepoint_dsp::AnalysisError>(())
/// ```
pub fn tap_tempo(taps: &[f32]) -> Result<f32, AnalysisError> {
    if taps.len() < 2 {
        return Err(AnalysisError::InvalidInput(format!(
            "Tap tempo needs at least 2 taps, got {}",
            taps.len()
        )));
    }
    if taps.iter().any(|t| !t.is_finite()) {
        return Err(AnalysisError::InvalidInput("Tap times must be finite".to_string()));
    }

    let mean_interval = taps.windows(2).map(|w| w[1] - w[0]).sum::<f32>() / (taps.len() - 1) as f32;
    if mean_interval <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Taps must be ascending (mean interval {:.4} s)",
            mean_interval
        )));
    }

    Ok(60.0 / mean_interval)
}

/// Synthesize a fixed-tempo grid from an existing result
///
/// Beats start exactly at `offset` and repeat every `60 / bpm` seconds up to the
/// later of the original last beat and a 5-minute cap. Downbeats are every
/// `beats_per_bar`-th beat. Confidence, time signature and algorithm carry over;
/// `manual_override` is set.
///
/// # Arguments
///
/// * `original` - Grid to adjust
/// * `offset` - Time of the first beat in seconds
/// * `bpm_override` - New tempo, or `None` to keep the original tempo
/// * `beats_per_bar` - Downbeat spacing in beats
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the tempo is not positive and finite,
/// or the offset is not finite
pub fn adjust_beatgrid(
    original: &BeatgridResult,
    offset: f32,
    bpm_override: Option<f32>,
    beats_per_bar: usize,
) -> Result<BeatgridResult, AnalysisError> {
    let bpm = bpm_override.unwrap_or(original.bpm);
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!("BPM must be > 0, got {}", bpm)));
    }
    if !offset.is_finite() {
        return Err(AnalysisError::InvalidInput(format!("Offset must be finite, got {}", offset)));
    }

    let interval = 60.0 / bpm;
    let last_original = original.beats.last().copied().unwrap_or(0.0);
    let end = last_original.max(ADJUST_SAFETY_CAP_SECONDS);
    let count = (((end - offset) / interval).floor().max(0.0) as usize + 1).max(1);

    let beats: Vec<f32> = (0..count).map(|i| offset + i as f32 * interval).collect();
    let downbeats = beats.iter().copied().step_by(beats_per_bar.max(1)).collect();

    log::debug!(
        "Adjusted beatgrid: {} beats at {:.2} BPM from {:.3} s",
        beats.len(),
        bpm,
        offset
    );

    Ok(BeatgridResult {
        bpm,
        confidence: original.confidence,
        beats,
        downbeats,
        time_signature: original.time_signature,
        tempo_changes: original.tempo_changes.clone(),
        algorithm: original.algorithm.clone(),
        analysis_time: original.analysis_time,
        manual_override: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::TimeSignature;

    fn grid(bpm: f32, beats: Vec<f32>) -> BeatgridResult {
        BeatgridResult {
            bpm,
            confidence: 0.42,
            downbeats: beats.iter().copied().step_by(4).collect(),
            beats,
            time_signature: TimeSignature::default(),
            tempo_changes: Vec::new(),
            algorithm: "dynamic_programming".to_string(),
            analysis_time: 1.5,
            manual_override: false,
        }
    }

    #[test]
    fn test_tap_tempo_120() {
        let bpm = tap_tempo(&[0.0, 0.5, 1.0, 1.5, 2.0]).unwrap();
        assert!((bpm - 120.0).abs() < 0.01);
    }

    #[test]
    fn test_tap_tempo_needs_two_taps() {
        assert!(matches!(tap_tempo(&[1.0]), Err(AnalysisError::InvalidInput(_))));
        assert!(tap_tempo(&[]).unwrap_err().is_validation());
    }

    #[test]
    fn test_tap_tempo_rejects_descending() {
        assert!(tap_tempo(&[2.0, 1.0]).is_err());
    }

    #[test]
    fn test_adjust_with_override() {
        let original = grid(128.0, vec![0.0, 0.46875, 0.9375, 1.40625]);
        let adjusted = adjust_beatgrid(&original, 0.1, Some(130.0), 4).unwrap();

        assert_eq!(adjusted.bpm, 130.0);
        assert!(adjusted.manual_override);
        assert_eq!(adjusted.beats[0], 0.1);
        assert_eq!(adjusted.confidence, 0.42);
        assert!(adjusted.beats.windows(2).all(|w| w[1] > w[0]));
        assert!(*adjusted.beats.last().unwrap() <= ADJUST_SAFETY_CAP_SECONDS);
        assert_eq!(adjusted.downbeats[1], adjusted.beats[4]);
    }

    #[test]
    fn test_adjust_keeps_tempo_and_covers_long_grid() {
        let beats: Vec<f32> = (0..800).map(|i| i as f32 * 0.5).collect();
        let adjusted = adjust_beatgrid(&grid(120.0, beats), 0.25, None, 4).unwrap();
        assert_eq!(adjusted.bpm, 120.0);
        let last = *adjusted.beats.last().unwrap();
        assert!(last > 399.0 && last <= 399.5, "last beat {}", last);
    }

    #[test]
    fn test_adjust_offset_past_end_gives_single_beat() {
        let adjusted = adjust_beatgrid(&grid(120.0, vec![0.0, 0.5]), 500.0, None, 4).unwrap();
        assert_eq!(adjusted.beats, vec![500.0]);
    }

    #[test]
    fn test_adjust_rejects_bad_tempo() {
        let original = grid(120.0, vec![0.0, 0.5]);
        assert!(adjust_beatgrid(&original, 0.0, Some(0.0), 4).is_err());
        assert!(adjust_beatgrid(&original, 0.0, Some(f32::NAN), 4).is_err());
        assert!(adjust_beatgrid(&original, f32::INFINITY, None, 4).is_err());
    }
}
