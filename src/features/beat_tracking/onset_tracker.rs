//! Onset-based beat tracking
//!
//! Takes energy flux onsets directly as beat candidates. Cheap and robust on
//! percussive material; the detector's interval filter and tempo estimator do the
//! rest.

use super::BeatTracker;
use crate::error::AnalysisError;
use crate::features::onset::energy_flux::detect_energy_flux_onsets;

/// Onset threshold relative to the strongest flux, in dB
pub const DEFAULT_THRESHOLD_DB: f32 = -20.0;

/// Beat tracker that reports energy flux onsets
#[derive(Debug, Clone)]
pub struct EnergyFluxTracker {
    frame_size: usize,
    hop_size: usize,
    threshold_db: f32,
}

impl EnergyFluxTracker {
    /// Create a tracker with the default -20 dB threshold
    pub fn new(frame_size: usize, hop_size: usize) -> Self {
        Self {
            frame_size,
            hop_size,
            threshold_db: DEFAULT_THRESHOLD_DB,
        }
    }

    /// Override the relative onset threshold
    pub fn with_threshold_db(mut self, threshold_db: f32) -> Self {
        self.threshold_db = threshold_db;
        self
    }
}

impl BeatTracker for EnergyFluxTracker {
    fn name(&self) -> &str {
        "energy_flux"
    }

    fn track_beats(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, AnalysisError> {
        let onsets = detect_energy_flux_onsets(
            samples,
            sample_rate,
            self.frame_size,
            self.hop_size,
            self.threshold_db,
        )?;
        log::debug!("Energy flux tracker: {} candidate beats", onsets.len());
        Ok(onsets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_track(bpm: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        let interval = (60.0 / bpm * sample_rate as f32) as usize;
        let mut samples = vec![0.0f32; n];
        for start in (0..n).step_by(interval) {
            for s in samples.iter_mut().skip(start).take(200) {
                *s = 0.9;
            }
        }
        samples
    }

    #[test]
    fn test_energy_flux_tracker_clicks() {
        let tracker = EnergyFluxTracker::new(2048, 512);
        let beats = tracker.track_beats(&click_track(120.0, 5.0, 22050), 22050).unwrap();
        assert!(beats.len() >= 8, "got {} beats", beats.len());
        assert!(beats.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_energy_flux_tracker_silence() {
        let tracker = EnergyFluxTracker::new(2048, 512).with_threshold_db(-30.0);
        assert!(tracker.track_beats(&vec![0.0; 22050], 22050).unwrap().is_empty());
    }
}
