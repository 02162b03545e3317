//! Onset detection modules
//!
//! - Energy flux onset picking (time-domain, used as a beat candidate source)
//! - Onset-strength envelope (log-mel spectral flux, used for tempo and stability)

pub mod energy_flux;
pub mod strength;
