//! Channel mixing utilities (multi-channel to mono conversion)

/// Downmix any number of equal-length channels to mono by per-sample averaging
///
/// # Arguments
///
/// * `channels` - Channel sample vectors (shorter channels are treated as zero-padded)
///
/// # Returns
///
/// Mono samples, as long as the longest channel
///
/// # Example
///
/// ```
/// use cuepoint_dsp::preprocessing::channel_mixer::downmix_to_mono;
///
/// let mono = downmix_to_mono(&[vec![1.0, 0.0], vec![0.0, 1.0]]);
/// assert_eq!(mono, vec![0.5, 0.5]);
/// ```
pub fn downmix_to_mono(channels: &[Vec<f32>]) -> Vec<f32> {
    match channels {
        [] => Vec::new(),
        [only] => only.clone(),
        _ => {
            let len = channels.iter().map(Vec::len).max().unwrap_or(0);
            let scale = 1.0 / channels.len() as f32;
            log::debug!("Downmixing {} channels x {} samples to mono", channels.len(), len);

            let mut mono = vec![0.0f32; len];
            for channel in channels {
                for (out, &s) in mono.iter_mut().zip(channel) {
                    *out += s;
                }
            }
            for s in &mut mono {
                *s *= scale;
            }
            mono
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_passthrough() {
        let mono = downmix_to_mono(&[vec![0.1, -0.2, 0.3]]);
        assert_eq!(mono, vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_stereo_average() {
        let mono = downmix_to_mono(&[vec![1.0, -1.0, 0.5], vec![0.0, 1.0, 0.5]]);
        assert_eq!(mono, vec![0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_three_channels() {
        let mono = downmix_to_mono(&[vec![0.3], vec![0.6], vec![0.0]]);
        assert!((mono[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_empty() {
        assert!(downmix_to_mono(&[]).is_empty());
    }
}
