//! Segment boundary detection
//!
//! # Algorithm
//!
//! 1. Combined per-frame matrix: energy, spectral centroid, the first 5 cepstral
//!    coefficients and the octave-summed chroma, each divided by its own maximum
//! 2. Average frames into ~1 second blocks
//! 3. Agglomerative (Ward) clustering restricted to adjacent blocks, down to
//!    `round(duration / (2 · min_section_duration))` clusters
//! 4. Absorb clusters shorter than the minimum section duration into the cheaper
//!    neighbour
//! 5. Cluster starts become boundaries; 0 and the track duration are always included
//!
//! Degenerate input (too short, constant or non-finite features) falls back to
//! fixed ~30 second windows, so detection never fails.

use crate::config::StructureConfig;
use crate::error::AnalysisError;
use crate::features::chroma::normalization::octave_sum;
use crate::features::extractor::FeatureSet;

/// Denominator guard for per-feature normalization
const NORM_EPSILON: f32 = 1e-8;

/// Cepstral coefficients included in the combined matrix
const BOUNDARY_MFCCS: usize = 5;

/// Target length of fallback windows in seconds
pub const FALLBACK_WINDOW_SECONDS: f32 = 30.0;

/// Upper bound on the number of fallback windows
pub const MAX_FALLBACK_WINDOWS: usize = 8;

/// Boundary times and how they were obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Ascending boundary times, first 0, last the track duration
    pub boundaries: Vec<f32>,
    /// True when fixed windows replaced clustering
    pub fallback: bool,
}

impl Segmentation {
    /// Algorithm tag reported in the structure result
    pub fn algorithm(&self) -> &'static str {
        if self.fallback {
            "fixed_window_segmentation"
        } else {
            "agglomerative_segmentation"
        }
    }

    /// Consecutive `(start, end)` pairs
    pub fn segments(&self) -> Vec<(f32, f32)> {
        self.boundaries.windows(2).map(|w| (w[0], w[1])).collect()
    }
}

/// Equal windows of about 30 s spanning `[0, duration]`, at most 8
///
/// # Example
///
/// ```
/// use cuepoint_dsp::structure::boundaries::fixed_windows;
///
/// assert_eq!(fixed_windows(90.0), vec![0.0, 30.0, 60.0, 90.0]);
/// assert_eq!(fixed_windows(600.0).len(), 9);
/// ```
pub fn fixed_windows(duration: f32) -> Vec<f32> {
    let count = ((duration / FALLBACK_WINDOW_SECONDS).ceil() as usize).clamp(1, MAX_FALLBACK_WINDOWS);
    let mut boundaries: Vec<f32> = (0..count).map(|i| i as f32 * duration / count as f32).collect();
    boundaries.push(duration);
    boundaries
}

/// Largest absolute value (0 for an empty series)
fn abs_max(values: impl Iterator<Item = f32>) -> f32 {
    values.fold(0.0f32, |m, v| m.max(v.abs()))
}

/// Per-frame combined feature rows, each column scaled by its own maximum
pub fn combined_feature_matrix(features: &FeatureSet) -> Vec<Vec<f32>> {
    let n_mfcc = features
        .mfcc
        .first()
        .map(|row| row.len().min(BOUNDARY_MFCCS))
        .unwrap_or(0);

    let energy_max = abs_max(features.energy.iter().copied()) + NORM_EPSILON;
    let centroid_max = abs_max(features.spectral_centroid.iter().copied()) + NORM_EPSILON;
    let mfcc_max: Vec<f32> = (0..n_mfcc)
        .map(|k| abs_max(features.mfcc.iter().map(|row| row[k])) + NORM_EPSILON)
        .collect();
    let chroma_envelope = octave_sum(&features.chroma);
    let chroma_max = abs_max(chroma_envelope.iter().copied()) + NORM_EPSILON;

    (0..features.n_frames())
        .map(|i| {
            let mut row = Vec::with_capacity(3 + n_mfcc);
            row.push(features.energy[i] / energy_max);
            row.push(features.spectral_centroid[i] / centroid_max);
            row.extend((0..n_mfcc).map(|k| features.mfcc[i][k] / mfcc_max[k]));
            row.push(chroma_envelope.get(i).copied().unwrap_or(0.0) / chroma_max);
            row
        })
        .collect()
}

/// Contiguous run of blocks with its feature sum
#[derive(Debug, Clone)]
struct Cluster {
    start: usize,
    size: usize,
    sum: Vec<f32>,
}

impl Cluster {
    fn mean(&self) -> impl Iterator<Item = f32> + '_ {
        let n = self.size as f32;
        self.sum.iter().map(move |&s| s / n)
    }

    /// Ward linkage: increase in within-cluster variance if merged
    fn ward_cost(&self, other: &Cluster) -> f32 {
        let (na, nb) = (self.size as f32, other.size as f32);
        let distance: f32 = self
            .mean()
            .zip(other.mean())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        na * nb / (na + nb) * distance
    }

    fn absorb(&mut self, other: Cluster) {
        self.start = self.start.min(other.start);
        self.size += other.size;
        for (s, o) in self.sum.iter_mut().zip(other.sum) {
            *s += o;
        }
    }
}

/// Finds section boundaries in a feature set
#[derive(Debug, Clone)]
pub struct SegmentBoundaryDetector {
    min_section_duration: f32,
    max_sections: usize,
}

impl SegmentBoundaryDetector {
    /// Create a detector
    pub fn new(min_section_duration: f32, max_sections: usize) -> Self {
        Self {
            min_section_duration,
            max_sections,
        }
    }

    /// Create a detector from structure settings
    pub fn from_config(config: &StructureConfig) -> Self {
        Self::new(config.min_section_duration, config.max_sections)
    }

    /// Detect boundaries, falling back to fixed windows on degenerate input
    pub fn detect(&self, features: &FeatureSet, duration: f32) -> Segmentation {
        match self.cluster_boundaries(features, duration) {
            Ok(boundaries) => Segmentation {
                boundaries,
                fallback: false,
            },
            Err(e) => {
                log::warn!("Boundary detection fell back to fixed windows: {}", e);
                Segmentation {
                    boundaries: fixed_windows(duration),
                    fallback: true,
                }
            }
        }
    }

    /// Clustering-based boundaries
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` for fewer than 2 blocks, constant
    /// features or fewer than 2 boundaries, `AnalysisError::NumericalError` for
    /// non-finite features
    pub fn cluster_boundaries(&self, features: &FeatureSet, duration: f32) -> Result<Vec<f32>, AnalysisError> {
        let matrix = combined_feature_matrix(features);
        if matrix.iter().flatten().any(|v| !v.is_finite()) {
            return Err(AnalysisError::NumericalError(
                "Combined feature matrix contains non-finite values".to_string(),
            ));
        }

        let block_frames = ((features.sample_rate as f32 / features.hop_length as f32).round() as usize).max(1);
        let blocks: Vec<Vec<f32>> = matrix
            .chunks(block_frames)
            .map(|chunk| {
                let mut sum = vec![0.0f32; chunk[0].len()];
                for row in chunk {
                    for (s, &v) in sum.iter_mut().zip(row) {
                        *s += v;
                    }
                }
                sum.iter().map(|s| s / chunk.len() as f32).collect()
            })
            .collect();

        if blocks.len() < 2 {
            return Err(AnalysisError::ProcessingError(format!(
                "Too few feature blocks for clustering: {}",
                blocks.len()
            )));
        }
        if total_variance(&blocks) <= NORM_EPSILON {
            return Err(AnalysisError::ProcessingError(
                "Feature blocks are constant, nothing to segment".to_string(),
            ));
        }

        let block_seconds = features.frame_to_time(block_frames);
        let target = ((duration / (2.0 * self.min_section_duration)).round() as usize)
            .clamp(2, self.max_sections.max(2))
            .min(blocks.len());

        let mut clusters: Vec<Cluster> = blocks
            .into_iter()
            .enumerate()
            .map(|(i, sum)| Cluster {
                start: i,
                size: 1,
                sum,
            })
            .collect();

        while clusters.len() > target {
            let i = cheapest_merge(&clusters);
            let right = clusters.remove(i + 1);
            clusters[i].absorb(right);
        }

        // Absorb clusters shorter than the minimum, shortest first
        while clusters.len() > 1 {
            let shortest = (0..clusters.len())
                .min_by_key(|&i| clusters[i].size)
                .unwrap_or(0);
            let seconds = self.cluster_seconds(&clusters, shortest, block_seconds, duration);
            if seconds >= self.min_section_duration {
                break;
            }
            let into_left = if shortest == 0 {
                false
            } else if shortest == clusters.len() - 1 {
                true
            } else {
                clusters[shortest].ward_cost(&clusters[shortest - 1])
                    <= clusters[shortest].ward_cost(&clusters[shortest + 1])
            };
            if into_left {
                let cluster = clusters.remove(shortest);
                clusters[shortest - 1].absorb(cluster);
            } else {
                let right = clusters.remove(shortest + 1);
                clusters[shortest].absorb(right);
            }
        }

        let mut boundaries = vec![0.0f32];
        boundaries.extend(
            clusters
                .iter()
                .skip(1)
                .map(|c| c.start as f32 * block_seconds)
                .filter(|&t| t > 0.0 && t < duration),
        );
        boundaries.push(duration);
        boundaries.dedup();

        if boundaries.len() < 2 || duration <= 0.0 {
            return Err(AnalysisError::ProcessingError(format!(
                "Degenerate segmentation: {} boundaries",
                boundaries.len()
            )));
        }

        log::debug!(
            "Agglomerative segmentation: {} clusters (target {}), {:.2} s blocks",
            clusters.len(),
            target,
            block_seconds
        );

        Ok(boundaries)
    }

    /// Duration of cluster `i` in seconds, the last one ending at the track end
    fn cluster_seconds(&self, clusters: &[Cluster], i: usize, block_seconds: f32, duration: f32) -> f32 {
        let start = clusters[i].start as f32 * block_seconds;
        let end = clusters
            .get(i + 1)
            .map(|c| c.start as f32 * block_seconds)
            .unwrap_or(duration);
        end - start
    }
}

/// Sum over columns of the population variance across rows
fn total_variance(rows: &[Vec<f32>]) -> f32 {
    let n = rows.len() as f32;
    let dims = rows.first().map(Vec::len).unwrap_or(0);
    (0..dims)
        .map(|k| {
            let mean = rows.iter().map(|r| r[k]).sum::<f32>() / n;
            rows.iter().map(|r| (r[k] - mean) * (r[k] - mean)).sum::<f32>() / n
        })
        .sum()
}

/// Index `i` of the adjacent pair `(i, i + 1)` with the lowest Ward cost
fn cheapest_merge(clusters: &[Cluster]) -> usize {
    (0..clusters.len() - 1)
        .map(|i| (i, clusters[i].ward_cost(&clusters[i + 1])))
        .fold((0, f32::INFINITY), |best, (i, cost)| if cost < best.1 { (i, cost) } else { best })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extractor::FeatureExtractor;

    /// Alternating quiet/loud sections of noise-like tones
    fn sectioned_signal(sample_rate: u32, sections: &[(f32, f32, f32)]) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(seconds, freq, amplitude) in sections {
            let n = (seconds * sample_rate as f32) as usize;
            samples.extend((0..n).map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            }));
        }
        samples
    }

    #[test]
    fn test_fixed_windows() {
        assert_eq!(fixed_windows(10.0), vec![0.0, 10.0]);
        let long = fixed_windows(1000.0);
        assert_eq!(long.len(), MAX_FALLBACK_WINDOWS + 1);
        assert_eq!(*long.last().unwrap(), 1000.0);
    }

    #[test]
    fn test_segments_pair_boundaries() {
        let segmentation = Segmentation {
            boundaries: fixed_windows(90.0),
            fallback: true,
        };
        assert_eq!(segmentation.segments(), vec![(0.0, 30.0), (30.0, 60.0), (60.0, 90.0)]);
        assert_eq!(segmentation.algorithm(), "fixed_window_segmentation");
    }

    #[test]
    fn test_finds_section_change() {
        let sr = 8000;
        let samples = sectioned_signal(sr, &[(20.0, 220.0, 0.05), (20.0, 2000.0, 0.8)]);
        let features = FeatureExtractor::new(512, 2048).extract(&samples, sr).unwrap();
        let detector = SegmentBoundaryDetector::new(8.0, 20);

        let segmentation = detector.detect(&features, 40.0);
        assert!(!segmentation.fallback);
        assert_eq!(segmentation.algorithm(), "agglomerative_segmentation");
        assert_eq!(segmentation.boundaries.first(), Some(&0.0));
        assert_eq!(segmentation.boundaries.last(), Some(&40.0));
        assert!(
            segmentation.boundaries.iter().any(|&b| (b - 20.0).abs() < 1.5),
            "boundaries {:?}",
            segmentation.boundaries
        );
    }

    #[test]
    fn test_short_audio_falls_back() {
        let features = FeatureExtractor::new(512, 2048).extract(&vec![0.0; 44100], 44100).unwrap();
        let segmentation = SegmentBoundaryDetector::new(8.0, 20).detect(&features, 1.0);
        assert!(segmentation.fallback);
        assert_eq!(segmentation.algorithm(), "fixed_window_segmentation");
        assert_eq!(segmentation.boundaries, vec![0.0, 1.0]);
    }

    #[test]
    fn test_minimum_section_length_respected() {
        let sr = 8000;
        let samples = sectioned_signal(
            sr,
            &[(30.0, 300.0, 0.1), (3.0, 3000.0, 0.9), (30.0, 300.0, 0.1), (30.0, 1200.0, 0.5)],
        );
        let features = FeatureExtractor::new(512, 2048).extract(&samples, sr).unwrap();
        let segmentation = SegmentBoundaryDetector::new(8.0, 20).detect(&features, 93.0);
        let boundaries = &segmentation.boundaries;
        for pair in boundaries.windows(2) {
            assert!(pair[1] - pair[0] >= 8.0 - 1e-3, "boundaries {:?}", boundaries);
        }
    }

    #[test]
    fn test_ward_cost_prefers_similar_clusters() {
        let a = Cluster { start: 0, size: 1, sum: vec![0.0, 0.0] };
        let b = Cluster { start: 1, size: 1, sum: vec![0.1, 0.0] };
        let c = Cluster { start: 2, size: 1, sum: vec![1.0, 1.0] };
        assert_eq!(cheapest_merge(&[a, b, c]), 0);
    }
}
