//! # Cuepoint DSP
//!
//! Beatgrid and song-structure analysis for DJ tooling.
//!
//! ## Features
//!
//! - **Beatgrid**: Multi-algorithm beat tracking (dynamic programming, energy flux)
//!   with IQR-robust tempo estimation, BPM range correction and downbeat inference
//! - **Manual Grids**: Tap tempo and fixed-tempo grid re-anchoring
//! - **Structure**: Feature-based segmentation and rule-cascade labeling into
//!   intro/verse/chorus/bridge/breakdown/buildup/drop/outro sections
//!
//! ## Quick Start
//!
//! ```no_run
//! use cuepoint_dsp::{analyze_beatgrid, analyze_structure, AnalysisConfig, SampleBuffer};
//!
//! // Decoded audio (mono or multi-channel, f32)
//! let buffer = SampleBuffer::mono(vec![0.0f32; 44100 * 30], 44100)?;
//! let config = AnalysisConfig::default();
//!
//! let grid = analyze_beatgrid(&buffer, &config)?;
//! println!("BPM: {:.2} (confidence: {:.2})", grid.bpm, grid.confidence);
//!
//! let structure = analyze_structure(&buffer, &config)?;
//! println!("{} sections", structure.sections.len());
//! # Ok::<(), cuepoint_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Beat pipeline:      Samples → Beat trackers → Tempo estimate → Range correction → Downbeats
//! Structure pipeline: Samples → Features → Boundaries → Classification → Post-processing
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod beatgrid;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod structure;

// Re-export main types
pub use analysis::result::{
    BeatgridResult, StructureAnalysisResult, StructureSection, StructureType, TempoChange, TimeSignature,
};
pub use beatgrid::BeatgridEngine;
pub use config::{AnalysisConfig, BeatgridConfig, StructureConfig};
pub use error::AnalysisError;
pub use io::sample_buffer::SampleBuffer;
pub use structure::StructureAnalyzer;

/// Beatgrid analysis
///
/// Builds a one-off [`BeatgridEngine`] and analyzes the buffer. Keep an engine
/// around instead when analyzing many tracks.
///
/// # Arguments
///
/// * `buffer` - Decoded audio; multi-channel input is averaged to mono
/// * `config` - Analysis configuration (only the beatgrid section is read)
///
/// # Returns
///
/// `BeatgridResult` with BPM, confidence, beats and downbeats
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an invalid configuration, or
/// `AnalysisError::BeatDetection` if every beat algorithm failed
///
/// # Example
///
/// ```no_run
/// use cuepoint_dsp::{analyze_beatgrid, AnalysisConfig, SampleBuffer};
///
/// let buffer = SampleBuffer::mono(vec![0.0f32; 44100 * 30], 44100)?;
/// let grid = analyze_beatgrid(&buffer, &AnalysisConfig::default())?;
/// # Ok::<(), cuepoint_dsp::AnalysisError>(())
/// ```
pub fn analyze_beatgrid(buffer: &SampleBuffer, config: &AnalysisConfig) -> Result<BeatgridResult, AnalysisError> {
    BeatgridEngine::new(config.beatgrid.clone())?.analyze(buffer)
}

/// Structure analysis
///
/// Builds a one-off [`StructureAnalyzer`] and analyzes the buffer.
///
/// # Arguments
///
/// * `buffer` - Decoded audio; multi-channel input is averaged to mono
/// * `config` - Analysis configuration (only the structure section is read)
///
/// # Returns
///
/// `StructureAnalysisResult` whose sections cover the whole track
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an invalid configuration, or
/// `AnalysisError::FeatureExtraction` if the audio is shorter than one frame
pub fn analyze_structure(
    buffer: &SampleBuffer,
    config: &AnalysisConfig,
) -> Result<StructureAnalysisResult, AnalysisError> {
    StructureAnalyzer::new(config.structure.clone())?.analyze(buffer)
}
