//! Audio preprocessing modules
//!
//! Prepares decoded audio for analysis:
//! - Channel mixing (multi-channel to mono)
//! - Peak normalization

pub mod channel_mixer;
pub mod normalization;
