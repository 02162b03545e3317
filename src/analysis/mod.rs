//! Analysis result types and shared statistics
//!
//! - Beatgrid and structure result types
//! - Descriptive statistics used by tempo estimation and classification

pub mod result;
pub mod statistics;
