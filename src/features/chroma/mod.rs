//! Chroma extraction modules
//!
//! Pitch-class distribution (12 semitones) per frame:
//! - Chroma vector computation from a magnitude spectrogram
//! - Normalization strategies

pub mod extractor;
pub mod normalization;
