//! Decoded audio handed to the analysis pipelines

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_to_mono;

/// Per-channel float samples with their sample rate
///
/// Decoding and resampling happen upstream; both pipelines only borrow the buffer.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    /// Channel data, all channels the same length
    channels: Vec<Vec<f32>>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a buffer from per-channel sample vectors
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if there are no channels, the channels
    /// differ in length, or the sample rate is zero.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if channels.is_empty() {
            return Err(AnalysisError::InvalidInput("No audio channels".to_string()));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
        }
        let len = channels[0].len();
        if let Some((i, ch)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != len) {
            return Err(AnalysisError::InvalidInput(format!(
                "Channel {} has {} samples, channel 0 has {}",
                i,
                ch.len(),
                len
            )));
        }
        Ok(Self { channels, sample_rate })
    }

    /// Create a single-channel buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::new(vec![samples], sample_rate)
    }

    /// Create a buffer from interleaved samples (`L R L R ...`)
    pub fn from_interleaved(
        samples: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self, AnalysisError> {
        if channel_count == 0 {
            return Err(AnalysisError::InvalidInput("Channel count must be > 0".to_string()));
        }
        if samples.len() % channel_count != 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "{} interleaved samples do not divide into {} channels",
                samples.len(),
                channel_count
            )));
        }
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::new(channels, sample_rate)
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Channel data
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Mono view of the buffer (channel average)
    pub fn to_mono(&self) -> Vec<f32> {
        downmix_to_mono(&self.channels)
    }
}
