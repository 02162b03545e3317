//! Beat tracking modules
//!
//! Turn mono audio into raw beat timestamps:
//! - Dynamic-programming beat placement over an onset strength envelope
//! - Energy flux onsets taken directly as beat candidates
//!
//! Every backend implements [`BeatTracker`]; the beat detector runs them in the
//! configured order and scores their output with a shared tempo estimator.

pub mod dynamic_programming;
pub mod onset_tracker;

use crate::config::BeatgridConfig;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use dynamic_programming::DynamicProgrammingTracker;
pub use onset_tracker::EnergyFluxTracker;

/// A beat tracking backend
pub trait BeatTracker: Send + Sync {
    /// Identifier reported as the result's algorithm tag
    fn name(&self) -> &str;

    /// Raw beat timestamps in seconds, ascending
    ///
    /// # Arguments
    ///
    /// * `samples` - Mono audio samples, peak-normalized
    /// * `sample_rate` - Sample rate in Hz
    fn track_beats(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, AnalysisError>;
}

/// Beat tracking algorithm identifiers accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatAlgorithm {
    /// Onset envelope, tempo period, dynamic-programming beat placement
    DynamicProgramming,
    /// Energy flux onsets
    EnergyFlux,
}

impl BeatAlgorithm {
    /// All available algorithms in default priority order
    pub const ALL: [BeatAlgorithm; 2] = [BeatAlgorithm::DynamicProgramming, BeatAlgorithm::EnergyFlux];

    /// Configuration identifier
    pub fn id(&self) -> &'static str {
        match self {
            BeatAlgorithm::DynamicProgramming => "dynamic_programming",
            BeatAlgorithm::EnergyFlux => "energy_flux",
        }
    }

    /// Build the backend for this algorithm
    pub fn tracker(&self, config: &BeatgridConfig) -> Box<dyn BeatTracker> {
        match self {
            BeatAlgorithm::DynamicProgramming => Box::new(DynamicProgrammingTracker::new(
                config.frame_size,
                config.hop_size,
                config.min_bpm,
                config.max_bpm,
            )),
            BeatAlgorithm::EnergyFlux => {
                Box::new(EnergyFluxTracker::new(config.frame_size, config.hop_size))
            }
        }
    }
}

impl FromStr for BeatAlgorithm {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BeatAlgorithm::ALL
            .iter()
            .copied()
            .find(|a| a.id() == s)
            .ok_or_else(|| AnalysisError::InvalidInput(format!("Unknown beat algorithm: {}", s)))
    }
}

impl fmt::Display for BeatAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_ids_roundtrip() {
        for algorithm in BeatAlgorithm::ALL {
            assert_eq!(algorithm.id().parse::<BeatAlgorithm>().unwrap(), algorithm);
            assert_eq!(algorithm.to_string(), algorithm.id());
        }
    }

    #[test]
    fn test_unknown_algorithm_is_validation_error() {
        let err = "librosa".parse::<BeatAlgorithm>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&BeatAlgorithm::EnergyFlux).unwrap();
        assert_eq!(json, "\"energy_flux\"");
    }

    #[test]
    fn test_tracker_names_match_ids() {
        let config = BeatgridConfig::default();
        for algorithm in BeatAlgorithm::ALL {
            assert_eq!(algorithm.tracker(&config).name(), algorithm.id());
        }
    }
}
