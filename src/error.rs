//! Error types for beatgrid and structure analysis

use std::fmt;

/// Errors that can occur during analysis
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Malformed caller input (too few taps, empty buffer, bad configuration values)
    InvalidInput(String),

    /// Feature extraction could not be computed. Never recovered by a fallback.
    FeatureExtraction(String),

    /// Every configured beat algorithm failed or returned too few beats
    BeatDetection(String),

    /// Processing error inside a single algorithm
    ProcessingError(String),

    /// Numerical error (non-finite values, division by zero)
    NumericalError(String),

    /// Configuration could not be read or parsed
    Config(String),
}

impl AnalysisError {
    /// True for errors caused by malformed caller input rather than by the audio
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalysisError::InvalidInput(_) | AnalysisError::Config(_))
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::FeatureExtraction(msg) => write!(f, "Feature extraction failed: {}", msg),
            AnalysisError::BeatDetection(msg) => write!(f, "Beat detection failed: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            AnalysisError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}
