//! Beat pipeline
//!
//! Detection → BPM range correction → downbeats → clipping, plus the manual
//! tap-tempo and grid-adjust utilities.
//!
//! # Example
//!
//! ```no_run
//! use cuepoint_dsp::{BeatgridEngine, SampleBuffer};
//! use cuepoint_dsp::config::BeatgridConfig;
//!
//! let buffer = SampleBuffer::mono(vec![0.0f32; 44100 * 10], 44100)?;
//! let engine = BeatgridEngine::new(BeatgridConfig::default())?;
//! let grid = engine.analyze(&buffer)?;
//! println!("{:.2} BPM ({} beats)", grid.bpm, grid.beats.len());
//! # Ok::<(), cuepoint_dsp::AnalysisError>(())
//! ```

pub mod detector;
pub mod manual;
pub mod postprocess;
pub mod tempo;

use crate::analysis::result::{BeatgridResult, TimeSignature};
use crate::config::BeatgridConfig;
use crate::error::AnalysisError;
use crate::io::sample_buffer::SampleBuffer;
use detector::BeatDetector;
use postprocess::BeatgridPostProcessor;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

pub use detector::BeatCandidate;
pub use tempo::{filter_close_beats, TempoEstimate, TempoEstimator};

/// Beatgrid analysis engine
///
/// Holds immutable configuration and a single-flight guard: concurrent calls to
/// [`BeatgridEngine::analyze`] on one instance run one at a time.
#[derive(Debug)]
pub struct BeatgridEngine {
    config: BeatgridConfig,
    detector: BeatDetector,
    postprocessor: BeatgridPostProcessor,
    guard: Mutex<()>,
}

impl BeatgridEngine {
    /// Create an engine
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the configuration is invalid
    pub fn new(config: BeatgridConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            detector: BeatDetector::new(&config),
            postprocessor: BeatgridPostProcessor::new(config.min_bpm, config.max_bpm, config.beats_per_bar),
            config,
            guard: Mutex::new(()),
        })
    }

    /// Create an engine with a custom detector
    pub fn with_detector(config: BeatgridConfig, detector: BeatDetector) -> Result<Self, AnalysisError> {
        let mut engine = Self::new(config)?;
        engine.detector = detector;
        Ok(engine)
    }

    /// Engine configuration
    pub fn config(&self) -> &BeatgridConfig {
        &self.config
    }

    /// Analyze a sample buffer (multi-channel input is downmixed)
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::BeatDetection` if no algorithm produced a usable
    /// grid, `AnalysisError::InvalidInput` for an empty buffer
    pub fn analyze(&self, buffer: &SampleBuffer) -> Result<BeatgridResult, AnalysisError> {
        self.analyze_mono(&buffer.to_mono(), buffer.sample_rate())
    }

    /// Analyze mono samples
    pub fn analyze_mono(&self, samples: &[f32], sample_rate: u32) -> Result<BeatgridResult, AnalysisError> {
        let _in_flight = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let start_time = Instant::now();

        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
        }
        let duration = samples.len() as f32 / sample_rate as f32;

        log::debug!(
            "Starting beatgrid analysis: {} samples at {} Hz ({:.2} s)",
            samples.len(),
            sample_rate,
            duration
        );

        let candidate = self.detector.detect(samples, sample_rate)?;
        let grid = self.postprocessor.process(candidate.bpm, candidate.beats, duration);
        let analysis_time = start_time.elapsed().as_secs_f32();

        log::info!(
            "Beatgrid: {:.2} BPM, confidence {:.3}, {} beats via {} in {:.3} s",
            grid.bpm,
            candidate.confidence,
            grid.beats.len(),
            candidate.algorithm,
            analysis_time
        );

        Ok(BeatgridResult {
            bpm: grid.bpm,
            confidence: candidate.confidence,
            beats: grid.beats,
            downbeats: grid.downbeats,
            time_signature: TimeSignature::default(),
            tempo_changes: Vec::new(),
            algorithm: candidate.algorithm,
            analysis_time,
            manual_override: false,
        })
    }

    /// Tempo from manual taps, see [`manual::tap_tempo`]
    pub fn tap_tempo(&self, taps: &[f32]) -> Result<f32, AnalysisError> {
        manual::tap_tempo(taps)
    }

    /// Re-anchor a grid at `offset`, see [`manual::adjust_beatgrid`]
    pub fn adjust(
        &self,
        result: &BeatgridResult,
        offset: f32,
        bpm_override: Option<f32>,
    ) -> Result<BeatgridResult, AnalysisError> {
        manual::adjust_beatgrid(result, offset, bpm_override, self.config.beats_per_bar)
    }
}
