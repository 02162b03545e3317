//! Beatgrid post-processing: BPM range correction, downbeats, clipping

/// Bring `bpm` into `[min_bpm, max_bpm]` by octave steps
///
/// While `bpm < min` and doubling stays within range, double it and keep every
/// other beat; while `bpm > max` and halving stays within range, halve it and
/// insert a midpoint between each consecutive pair of beats. The guards make a
/// second application a no-op.
///
/// # Example
///
/// ```
/// use cuepoint_dsp::beatgrid::postprocess::clamp_to_range;
///
/// let (bpm, beats) = clamp_to_range(240.0, vec![0.0, 0.5, 1.0], 60.0, 200.0);
/// assert_eq!(bpm, 120.0);
/// assert_eq!(beats, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// ```
pub fn clamp_to_range(mut bpm: f32, mut beats: Vec<f32>, min_bpm: f32, max_bpm: f32) -> (f32, Vec<f32>) {
    while bpm < min_bpm && bpm * 2.0 <= max_bpm {
        bpm *= 2.0;
        beats = beats.into_iter().step_by(2).collect();
        log::debug!("BPM below range, doubled to {:.2} ({} beats)", bpm, beats.len());
    }
    while bpm > max_bpm && bpm / 2.0 >= min_bpm {
        bpm /= 2.0;
        beats = insert_midpoints(&beats);
        log::debug!("BPM above range, halved to {:.2} ({} beats)", bpm, beats.len());
    }
    (bpm, beats)
}

/// Beats with a linear-interpolated midpoint between every consecutive pair
fn insert_midpoints(beats: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(beats.len() * 2);
    for pair in beats.windows(2) {
        out.push(pair[0]);
        out.push(0.5 * (pair[0] + pair[1]));
    }
    out.extend(beats.last());
    out
}

/// Every `beats_per_bar`-th beat, starting with the first
pub fn infer_downbeats(beats: &[f32], beats_per_bar: usize) -> Vec<f32> {
    beats.iter().copied().step_by(beats_per_bar.max(1)).collect()
}

/// Keep only times inside `[0, duration]`
pub fn clip_to_duration(times: &mut Vec<f32>, duration: f32) {
    times.retain(|&t| (0.0..=duration).contains(&t));
}

/// Range correction, downbeat inference and clipping in one pass
#[derive(Debug, Clone)]
pub struct BeatgridPostProcessor {
    min_bpm: f32,
    max_bpm: f32,
    beats_per_bar: usize,
}

/// Post-processed beatgrid values
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedGrid {
    /// Range-corrected tempo
    pub bpm: f32,
    /// Beats within the track
    pub beats: Vec<f32>,
    /// Downbeats within the track
    pub downbeats: Vec<f32>,
}

impl BeatgridPostProcessor {
    /// Create a post-processor for a BPM range and bar length
    pub fn new(min_bpm: f32, max_bpm: f32, beats_per_bar: usize) -> Self {
        Self {
            min_bpm,
            max_bpm,
            beats_per_bar,
        }
    }

    /// Apply range correction, downbeat inference and clipping
    pub fn process(&self, bpm: f32, beats: Vec<f32>, duration: f32) -> ProcessedGrid {
        let (bpm, mut beats) = clamp_to_range(bpm, beats, self.min_bpm, self.max_bpm);
        let mut downbeats = infer_downbeats(&beats, self.beats_per_bar);
        clip_to_duration(&mut beats, duration);
        clip_to_duration(&mut downbeats, duration);
        ProcessedGrid {
            bpm,
            beats,
            downbeats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_doubles_slow_tempo() {
        let (bpm, beats) = clamp_to_range(50.0, vec![0.0, 1.2, 2.4, 3.6, 4.8], 60.0, 200.0);
        assert_eq!(bpm, 100.0);
        assert_eq!(beats, vec![0.0, 2.4, 4.8]);
    }

    #[test]
    fn test_clamp_halves_fast_tempo() {
        let (bpm, beats) = clamp_to_range(250.0, vec![0.0, 1.0], 60.0, 200.0);
        assert_eq!(bpm, 125.0);
        assert_eq!(beats, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_clamp_is_idempotent() {
        let once = clamp_to_range(30.0, (0..16).map(|i| i as f32).collect(), 60.0, 200.0);
        let twice = clamp_to_range(once.0, once.1.clone(), 60.0, 200.0);
        assert_eq!(once, twice);
        assert_eq!(once.0, 60.0);
    }

    #[test]
    fn test_clamp_in_range_untouched() {
        let beats = vec![0.0, 0.5, 1.0];
        assert_eq!(clamp_to_range(120.0, beats.clone(), 60.0, 200.0), (120.0, beats));
    }

    #[test]
    fn test_clamp_narrow_range_stops() {
        // Doubling 50 would give 100 > 90: left as is
        let (bpm, _) = clamp_to_range(50.0, vec![0.0, 1.2], 60.0, 90.0);
        assert_eq!(bpm, 50.0);
    }

    #[test]
    fn test_infer_downbeats() {
        let beats: Vec<f32> = (0..10).map(|i| i as f32 * 0.5).collect();
        assert_eq!(infer_downbeats(&beats, 4), vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_process_clips_to_duration() {
        let processor = BeatgridPostProcessor::new(60.0, 200.0, 4);
        let grid = processor.process(120.0, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5], 2.2);
        assert_eq!(grid.beats, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(grid.downbeats, vec![0.0, 2.0]);
    }
}
