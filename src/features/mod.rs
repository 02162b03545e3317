//! Feature extraction modules
//!
//! This module contains all feature extraction algorithms:
//! - STFT and per-frame spectral descriptors
//! - Mel spectrogram and cepstral coefficients
//! - Chroma extraction
//! - Onset detection (energy flux, onset strength)
//! - Period estimation (autocorrelation)
//! - Beat tracking (dynamic programming, onset-based)

pub mod beat_tracking;
pub mod chroma;
pub mod extractor;
pub mod mfcc;
pub mod onset;
pub mod period;
pub mod spectral;
pub mod spectrogram;

pub use extractor::{FeatureExtractor, FeatureSet};
