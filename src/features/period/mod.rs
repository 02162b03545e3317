//! Period estimation modules
//!
//! Find the dominant beat period of an onset envelope:
//! - FFT-accelerated autocorrelation with a tempo prior
//! - Peak picking and sub-sample refinement

pub mod autocorrelation;
pub mod peak_picking;
