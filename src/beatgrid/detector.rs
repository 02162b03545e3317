//! Hybrid beat detection
//!
//! Runs the configured beat tracking backends in priority order, scores each
//! backend's beats with the shared [`TempoEstimator`] and keeps the most
//! confident candidate. A failing backend is logged and skipped; only when every
//! backend fails does detection fail.

use super::tempo::{filter_close_beats, TempoEstimator};
use crate::config::BeatgridConfig;
use crate::error::AnalysisError;
use crate::features::beat_tracking::BeatTracker;
use crate::preprocessing::normalization::normalize_peak;

/// Best beat sequence found by the detector, before post-processing
#[derive(Debug, Clone, PartialEq)]
pub struct BeatCandidate {
    /// Name of the backend that produced it
    pub algorithm: String,
    /// Tempo in BPM (not yet range-corrected)
    pub bpm: f32,
    /// Confidence (0.0-1.0)
    pub confidence: f32,
    /// Filtered beat times in seconds
    pub beats: Vec<f32>,
}

/// Multi-algorithm beat detector
pub struct BeatDetector {
    trackers: Vec<Box<dyn BeatTracker>>,
    confidence_threshold: f32,
    min_beat_interval: f32,
    estimator: TempoEstimator,
}

impl std::fmt::Debug for BeatDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeatDetector")
            .field("trackers", &self.trackers.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("confidence_threshold", &self.confidence_threshold)
            .field("min_beat_interval", &self.min_beat_interval)
            .finish()
    }
}

impl BeatDetector {
    /// Create a detector with the configured algorithms
    pub fn new(config: &BeatgridConfig) -> Self {
        let trackers = config
            .algorithms
            .iter()
            .map(|algorithm| algorithm.tracker(config))
            .collect();
        Self::with_trackers(trackers, config)
    }

    /// Create a detector with custom backends, tried in the given order
    pub fn with_trackers(trackers: Vec<Box<dyn BeatTracker>>, config: &BeatgridConfig) -> Self {
        Self {
            trackers,
            confidence_threshold: config.confidence_threshold,
            min_beat_interval: config.min_beat_interval,
            estimator: TempoEstimator::default(),
        }
    }

    /// Backend names in priority order
    pub fn algorithm_names(&self) -> Vec<&str> {
        self.trackers.iter().map(|t| t.name()).collect()
    }

    /// Detect beats in mono audio
    ///
    /// # Arguments
    ///
    /// * `samples` - Mono audio samples
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    ///
    /// The highest-confidence candidate. Stops early once a candidate reaches the
    /// confidence threshold.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::BeatDetection` if every backend fails, yields
    /// fewer than 2 beats after filtering, or scores zero confidence
    pub fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<BeatCandidate, AnalysisError> {
        let mut normalized = samples.to_vec();
        let gain = normalize_peak(&mut normalized);
        log::debug!("Beat detection: {} samples, peak gain {:.3}", samples.len(), gain);

        let mut best: Option<BeatCandidate> = None;
        let mut failures: Vec<String> = Vec::new();

        for tracker in &self.trackers {
            let name = tracker.name();
            let candidate = match self.run_tracker(tracker.as_ref(), &normalized, sample_rate) {
                Ok(candidate) => candidate,
                Err(e) => {
                    log::warn!("Beat algorithm {} failed: {}", name, e);
                    failures.push(format!("{}: {}", name, e));
                    continue;
                }
            };

            log::debug!(
                "Beat algorithm {}: {:.2} BPM, confidence {:.3}, {} beats",
                name,
                candidate.bpm,
                candidate.confidence,
                candidate.beats.len()
            );

            let reached_threshold = candidate.confidence >= self.confidence_threshold;
            let best_confidence = best.as_ref().map_or(0.0, |b| b.confidence);
            if candidate.confidence > best_confidence {
                best = Some(candidate);
            } else if best.is_none() {
                failures.push(format!("{}: confidence {:.3}", name, candidate.confidence));
            }
            if reached_threshold {
                log::debug!("Beat algorithm {} reached confidence threshold", name);
                break;
            }
        }

        best.ok_or_else(|| {
            AnalysisError::BeatDetection(format!(
                "All beat tracking algorithms failed ({})",
                failures.join("; ")
            ))
        })
    }

    /// Run one backend and score its filtered beats
    fn run_tracker(
        &self,
        tracker: &dyn BeatTracker,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<BeatCandidate, AnalysisError> {
        let raw = tracker.track_beats(samples, sample_rate)?;
        let beats = filter_close_beats(&raw, self.min_beat_interval);
        if beats.len() < 2 {
            return Err(AnalysisError::ProcessingError(format!(
                "only {} usable beats",
                beats.len()
            )));
        }

        let estimate = self.estimator.estimate(&beats).ok_or_else(|| {
            AnalysisError::ProcessingError("no valid inter-beat interval".to_string())
        })?;

        Ok(BeatCandidate {
            algorithm: tracker.name().to_string(),
            bpm: estimate.bpm,
            confidence: estimate.confidence,
            beats,
        })
    }
}
