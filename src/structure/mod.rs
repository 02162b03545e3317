//! Structure pipeline
//!
//! Feature extraction → boundary detection → rule-cascade classification →
//! post-processing. The result always covers `[0, duration]` with contiguous
//! sections.
//!
//! # Example
//!
//! ```no_run
//! use cuepoint_dsp::{SampleBuffer, StructureAnalyzer};
//! use cuepoint_dsp::config::StructureConfig;
//!
//! let buffer = SampleBuffer::mono(vec![0.0f32; 44100 * 60], 44100)?;
//! let analyzer = StructureAnalyzer::new(StructureConfig::default())?;
//! let structure = analyzer.analyze(&buffer)?;
//! for section in &structure.sections {
//!     println!("{:>7.2}-{:>7.2} {}", section.start_time, section.end_time, section.label);
//! }
//! # Ok::<(), cuepoint_dsp::AnalysisError>(())
//! ```

pub mod boundaries;
pub mod classifier;
pub mod postprocess;

use crate::analysis::result::StructureAnalysisResult;
use crate::config::StructureConfig;
use crate::error::AnalysisError;
use crate::features::extractor::FeatureExtractor;
use crate::io::sample_buffer::SampleBuffer;
use boundaries::SegmentBoundaryDetector;
use classifier::SegmentClassifier;
use postprocess::StructurePostProcessor;
use std::time::Instant;

/// Song-structure analyzer
///
/// Holds only immutable configuration. Unlike [`crate::BeatgridEngine`] there is
/// no in-flight guard; callers sharing one instance across threads serialize
/// access themselves.
#[derive(Debug, Clone)]
pub struct StructureAnalyzer {
    config: StructureConfig,
    extractor: FeatureExtractor,
    boundary_detector: SegmentBoundaryDetector,
    classifier: SegmentClassifier,
    postprocessor: StructurePostProcessor,
}

impl StructureAnalyzer {
    /// Create an analyzer
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the configuration is invalid
    pub fn new(config: StructureConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::from_config(&config),
            boundary_detector: SegmentBoundaryDetector::from_config(&config),
            classifier: SegmentClassifier::from_config(&config),
            postprocessor: StructurePostProcessor::from_config(&config),
            config,
        })
    }

    /// Analyzer configuration
    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    /// Analyze a sample buffer (multi-channel input is downmixed)
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::FeatureExtraction` if the audio is shorter than one
    /// frame. Boundary detection never fails; it falls back to fixed windows.
    pub fn analyze(&self, buffer: &SampleBuffer) -> Result<StructureAnalysisResult, AnalysisError> {
        self.analyze_mono(&buffer.to_mono(), buffer.sample_rate())
    }

    /// Analyze mono samples
    pub fn analyze_mono(&self, samples: &[f32], sample_rate: u32) -> Result<StructureAnalysisResult, AnalysisError> {
        let start_time = Instant::now();

        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
        }
        let duration = samples.len() as f32 / sample_rate as f32;

        log::debug!(
            "Starting structure analysis: {} samples at {} Hz ({:.2} s)",
            samples.len(),
            sample_rate,
            duration
        );

        let features = self.extractor.extract(samples, sample_rate)?;
        let segmentation = self.boundary_detector.detect(&features, duration);
        log::debug!(
            "{} boundaries via {}",
            segmentation.boundaries.len(),
            segmentation.algorithm()
        );

        let classified = self
            .classifier
            .classify_segments(&features, &segmentation.segments(), duration);
        let sections = self.postprocessor.process(classified, duration);

        let confidence = if sections.is_empty() {
            0.0
        } else {
            sections.iter().map(|s| s.confidence).sum::<f32>() / sections.len() as f32
        };
        let analysis_time = start_time.elapsed().as_secs_f32();

        log::info!(
            "Structure: {} sections, confidence {:.3} via {} in {:.3} s",
            sections.len(),
            confidence,
            segmentation.algorithm(),
            analysis_time
        );

        Ok(StructureAnalysisResult {
            sections,
            confidence,
            analysis_time,
            algorithm: segmentation.algorithm().to_string(),
            features_used: features.feature_names(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::StructureType;

    #[test]
    fn test_invalid_config_rejected() {
        let config = StructureConfig {
            min_section_duration: 0.0,
            ..Default::default()
        };
        assert!(StructureAnalyzer::new(config).is_err());
    }

    #[test]
    fn test_too_short_fails_extraction() {
        let analyzer = StructureAnalyzer::new(StructureConfig::default()).unwrap();
        let result = analyzer.analyze_mono(&[0.1; 100], 44100);
        assert!(matches!(result, Err(AnalysisError::FeatureExtraction(_))));
    }

    #[test]
    fn test_silence_low_confidence() {
        let analyzer = StructureAnalyzer::new(StructureConfig::default()).unwrap();
        let result = analyzer.analyze_mono(&vec![0.0; 22050], 22050).unwrap();

        assert_eq!(result.algorithm, "fixed_window_segmentation");
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].section_type, StructureType::Unknown);
        assert_eq!(result.sections[0].start_time, 0.0);
        assert_eq!(result.sections[0].end_time, 1.0);
        assert!(result.confidence <= 0.1 + 1e-6);
        assert_eq!(result.features_used.len(), 7);
    }
}
