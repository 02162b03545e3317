//! Configuration parameters for beatgrid and structure analysis

use crate::error::AnalysisError;
use crate::features::beat_tracking::BeatAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Beat pipeline settings
    pub beatgrid: BeatgridConfig,

    /// Structure pipeline settings
    pub structure: StructureConfig,
}

impl AnalysisConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use cuepoint_dsp::AnalysisConfig;
    ///
    /// let config = AnalysisConfig::from_json_str(r#"{ "beatgrid": { "max_bpm": 180.0 } }"#)?;
    /// assert_eq!(config.beatgrid.max_bpm, 180.0);
    /// assert_eq!(config.beatgrid.min_bpm, 60.0);
    /// # Ok::<(), cuepoint_dsp::AnalysisError>(())
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| AnalysisError::Config(format!("Invalid JSON configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Check that every parameter is usable
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.beatgrid.validate()?;
        self.structure.validate()
    }
}

/// Beat pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatgridConfig {
    /// Beat tracking algorithms, tried in order (default: dynamic_programming, energy_flux)
    pub algorithms: Vec<BeatAlgorithm>,

    /// Confidence at which the detector stops trying further algorithms (default: 0.8)
    pub confidence_threshold: f32,

    /// Minimum valid BPM (default: 60.0)
    pub min_bpm: f32,

    /// Maximum valid BPM (default: 200.0)
    pub max_bpm: f32,

    /// Beats closer than this to the previous retained beat are dropped, in seconds (default: 0.2)
    pub min_beat_interval: f32,

    /// Frame size for the beat trackers' analysis (default: 2048)
    pub frame_size: usize,

    /// Hop size for the beat trackers' analysis (default: 512)
    pub hop_size: usize,

    /// Beats per downbeat group (default: 4). Fixed grouping, not meter detection.
    pub beats_per_bar: usize,
}

impl Default for BeatgridConfig {
    fn default() -> Self {
        Self {
            algorithms: vec![BeatAlgorithm::DynamicProgramming, BeatAlgorithm::EnergyFlux],
            confidence_threshold: 0.8,
            min_bpm: 60.0,
            max_bpm: 200.0,
            min_beat_interval: 0.2,
            frame_size: 2048,
            hop_size: 512,
            beats_per_bar: 4,
        }
    }
}

impl BeatgridConfig {
    /// Check beat pipeline parameters
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.algorithms.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "At least one beat algorithm must be configured".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(AnalysisError::InvalidInput(format!(
                "Confidence threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !self.min_bpm.is_finite()
            || !self.max_bpm.is_finite()
            || self.min_bpm <= 0.0
            || self.max_bpm <= self.min_bpm
        {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid BPM range: [{:.1}, {:.1}]",
                self.min_bpm, self.max_bpm
            )));
        }
        if !self.min_beat_interval.is_finite() || self.min_beat_interval < 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Minimum beat interval must be >= 0, got {}",
                self.min_beat_interval
            )));
        }
        if self.frame_size == 0 || self.hop_size == 0 {
            return Err(AnalysisError::InvalidInput(
                "Frame size and hop size must be > 0".to_string(),
            ));
        }
        if self.beats_per_bar == 0 {
            return Err(AnalysisError::InvalidInput(
                "Beats per bar must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Structure pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Minimum section duration in seconds (default: 8.0)
    pub min_section_duration: f32,

    /// Maximum number of segments produced by boundary detection (default: 20)
    pub max_sections: usize,

    /// STFT hop length (default: 512)
    pub hop_length: usize,

    /// STFT frame length (default: 2048)
    pub frame_length: usize,

    /// Mel bands for MFCC and onset strength (default: 128)
    pub n_mels: usize,

    /// Cepstral coefficients per frame (default: 13)
    pub n_mfcc: usize,

    /// Per-feature weights. Accepted and carried, but not read by classification.
    pub feature_weights: FeatureWeights,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            min_section_duration: 8.0,
            max_sections: 20,
            hop_length: 512,
            frame_length: 2048,
            n_mels: 128,
            n_mfcc: 13,
            feature_weights: FeatureWeights::default(),
        }
    }
}

impl StructureConfig {
    /// Check structure pipeline parameters
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.min_section_duration <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Minimum section duration must be > 0, got {}",
                self.min_section_duration
            )));
        }
        if self.max_sections < 2 {
            return Err(AnalysisError::InvalidInput(format!(
                "Maximum section count must be >= 2, got {}",
                self.max_sections
            )));
        }
        if self.hop_length == 0 || self.frame_length == 0 {
            return Err(AnalysisError::InvalidInput(
                "Hop length and frame length must be > 0".to_string(),
            ));
        }
        if self.n_mels == 0 || self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid mel/MFCC sizes: n_mels={}, n_mfcc={}",
                self.n_mels, self.n_mfcc
            )));
        }
        Ok(())
    }
}

/// Feature weighting map for section classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    /// Energy weight (default: 0.3)
    pub energy: f32,
    /// Spectral centroid weight (default: 0.2)
    pub spectral_centroid: f32,
    /// MFCC weight (default: 0.25)
    pub mfcc: f32,
    /// Chroma weight (default: 0.15)
    pub chroma: f32,
    /// Tempo weight (default: 0.1)
    pub tempo: f32,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            energy: 0.3,
            spectral_centroid: 0.2,
            mfcc: 0.25,
            chroma: 0.15,
            tempo: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "beatgrid": { "algorithms": ["energy_flux"], "confidence_threshold": 0.5 },
                 "structure": { "min_section_duration": 12.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.beatgrid.algorithms, vec![BeatAlgorithm::EnergyFlux]);
        assert_eq!(config.beatgrid.confidence_threshold, 0.5);
        assert_eq!(config.beatgrid.hop_size, 512);
        assert_eq!(config.structure.min_section_duration, 12.0);
        assert_eq!(config.structure.max_sections, 20);
        assert_eq!(config.structure.feature_weights, FeatureWeights::default());
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let result = AnalysisConfig::from_json_str(r#"{ "beatgrid": { "algorithms": ["madness"] } }"#);
        assert!(matches!(result, Err(AnalysisError::Config(_))));
    }

    #[test]
    fn test_non_finite_bpm_range_rejected() {
        for (min_bpm, max_bpm) in [(f32::NAN, 200.0), (60.0, f32::NAN), (60.0, f32::INFINITY)] {
            let config = BeatgridConfig {
                min_bpm,
                max_bpm,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_invalid_bpm_range_rejected() {
        let result = AnalysisConfig::from_json_str(
            r#"{ "beatgrid": { "min_bpm": 150.0, "max_bpm": 100.0 } }"#,
        );
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = AnalysisConfig::from_json_file("/nonexistent/cuepoint.json");
        assert!(matches!(result, Err(AnalysisError::Config(_))));
    }
}
