//! Audio input types
//!
//! The sample buffer both pipelines borrow. Decoding happens upstream.

pub mod sample_buffer;
