//! Chroma normalization strategies

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Scale a chroma vector so its largest pitch class is 1.0
///
/// Silent frames (all energy below epsilon) become all zeros.
pub fn normalize_max(chroma: &mut [f32]) {
    let max = chroma.iter().copied().fold(0.0f32, f32::max);
    if max <= EPSILON {
        chroma.iter_mut().for_each(|c| *c = 0.0);
        return;
    }
    for c in chroma.iter_mut() {
        *c /= max;
    }
}

/// Sum of the twelve pitch classes of each frame
///
/// Gives a per-frame tonal-energy envelope (pitch classes folded together).
pub fn octave_sum(chroma: &[Vec<f32>]) -> Vec<f32> {
    chroma.iter().map(|frame| frame.iter().sum()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_max() {
        let mut chroma = vec![0.5, 2.0, 1.0];
        normalize_max(&mut chroma);
        assert_eq!(chroma, vec![0.25, 1.0, 0.5]);
    }

    #[test]
    fn test_normalize_silent() {
        let mut chroma = vec![0.0; 12];
        normalize_max(&mut chroma);
        assert!(chroma.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_octave_sum() {
        let sums = octave_sum(&[vec![1.0, 0.5], vec![0.0, 0.0]]);
        assert_eq!(sums, vec![1.5, 0.0]);
    }
}
