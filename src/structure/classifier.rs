//! Rule-based section classification
//!
//! Each segment is summarized by aggregate features, then matched against an
//! ordered rule table; the first matching rule decides type and confidence. The
//! table ends in an always-true rule, so classification cannot fail.

use crate::analysis::result::{StructureSection, StructureType};
use crate::analysis::statistics::{mean, std_dev, variance};
use crate::config::StructureConfig;
use crate::features::extractor::FeatureSet;
use crate::features::period::autocorrelation::autocorrelate;
use crate::features::period::peak_picking::find_peaks;

/// Guard added to means in stability ratios
const STABILITY_EPSILON: f32 = 1e-8;

/// Onset samples needed for a stability score
const MIN_STABILITY_SAMPLES: usize = 10;

/// Autocorrelation peaks below this fraction of the maximum are ignored
const STABILITY_PEAK_FRACTION: f32 = 0.3;

/// Energy scale: `min(1, energy · 10)`
const ENERGY_SCALE: f32 = 10.0;

/// Centroid scale: `min(1, centroid / 4000)`
const CENTROID_SCALE_HZ: f32 = 4000.0;

/// Regularity of an onset strength envelope in `[0, 1]`
///
/// Spacing regularity of autocorrelation peaks at ≥30% of the maximum when
/// there are at least two; otherwise `1 − std / mean` of the envelope itself.
/// Fewer than 10 samples, or an envelope without onset energy, score 0.
pub fn tempo_stability(onset: &[f32]) -> f32 {
    if onset.len() < MIN_STABILITY_SAMPLES {
        return 0.0;
    }

    let acf = autocorrelate(onset);
    let acf_max = acf.iter().copied().fold(0.0f32, f32::max);
    if acf_max <= 0.0 {
        return 0.0;
    }
    let peaks = find_peaks(&acf, STABILITY_PEAK_FRACTION * acf_max);

    let stability = if peaks.len() > 1 {
        let spacing: Vec<f32> = peaks.windows(2).map(|w| (w[1] - w[0]) as f32).collect();
        1.0 - std_dev(&spacing) / (mean(&spacing) + STABILITY_EPSILON)
    } else {
        1.0 - std_dev(onset) / (mean(onset) + STABILITY_EPSILON)
    };

    stability.clamp(0.0, 1.0)
}

/// Aggregate features of one candidate segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFeatures {
    /// Segment start in seconds
    pub start_time: f32,
    /// Segment end in seconds
    pub end_time: f32,
    /// Ordinal of the segment in the track
    pub index: usize,
    /// Mean RMS energy
    pub energy_mean: f32,
    /// Variance of RMS energy
    pub energy_variance: f32,
    /// Mean spectral centroid in Hz
    pub centroid_mean: f32,
    /// Variance of the spectral centroid
    pub centroid_variance: f32,
    /// Tempo stability score (0.0-1.0)
    pub tempo_stability: f32,
}

impl SegmentFeatures {
    /// Aggregate the frames of `features` inside `[start_time, end_time)`
    ///
    /// An empty frame range yields all-zero features.
    pub fn from_features(features: &FeatureSet, start_time: f32, end_time: f32, index: usize) -> Self {
        let n = features.n_frames();
        let start = features.time_to_frame(start_time).min(n);
        let end = features.time_to_frame(end_time).min(n);

        let (energy, centroid, onset) = if start < end {
            (
                &features.energy[start..end],
                &features.spectral_centroid[start..end],
                &features.onset_strength[start..end],
            )
        } else {
            (&[][..], &[][..], &[][..])
        };

        Self {
            start_time,
            end_time,
            index,
            energy_mean: mean(energy),
            energy_variance: variance(energy),
            centroid_mean: mean(centroid),
            centroid_variance: variance(centroid),
            tempo_stability: tempo_stability(onset),
        }
    }

    /// Segment length in seconds
    pub fn duration(&self) -> f32 {
        self.end_time - self.start_time
    }
}

/// Normalized values the rule predicates read
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleInputs {
    /// Energy scaled to `[0, 1]`
    pub energy: f32,
    /// Spectral centroid scaled to `[0, 1]`
    pub centroid: f32,
    /// Segment start as a fraction of the track duration
    pub position: f32,
    /// Raw energy variance
    pub energy_variance: f32,
    /// Tempo stability score
    pub tempo_stability: f32,
}

impl RuleInputs {
    /// Normalize a segment's features against the track duration
    pub fn new(segment: &SegmentFeatures, track_duration: f32) -> Self {
        let position = if track_duration > 0.0 {
            segment.start_time / track_duration
        } else {
            0.0
        };
        Self {
            energy: (segment.energy_mean * ENERGY_SCALE).min(1.0),
            centroid: (segment.centroid_mean / CENTROID_SCALE_HZ).min(1.0),
            position,
            energy_variance: segment.energy_variance,
            tempo_stability: segment.tempo_stability,
        }
    }
}

/// One entry of the classification cascade
#[derive(Clone, Copy)]
pub struct ClassificationRule {
    /// Rule name, for logging
    pub name: &'static str,
    /// Match condition
    pub predicate: fn(&RuleInputs) -> bool,
    /// Type assigned on match
    pub section_type: StructureType,
    /// Confidence assigned on match
    pub confidence: f32,
}

impl std::fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("name", &self.name)
            .field("section_type", &self.section_type)
            .field("confidence", &self.confidence)
            .finish()
    }
}

/// The cascade, evaluated top to bottom
pub static RULES: [ClassificationRule; 9] = [
    ClassificationRule {
        name: "intro",
        predicate: |x| x.position < 0.15 && x.energy < 0.6,
        section_type: StructureType::Intro,
        confidence: 0.8,
    },
    ClassificationRule {
        name: "outro",
        predicate: |x| x.position > 0.85 && x.energy < 0.5,
        section_type: StructureType::Outro,
        confidence: 0.8,
    },
    ClassificationRule {
        name: "drop",
        predicate: |x| x.energy > 0.8 && x.centroid > 0.7,
        section_type: StructureType::Drop,
        confidence: 0.9,
    },
    ClassificationRule {
        name: "breakdown",
        predicate: |x| x.energy < 0.3 && x.centroid < 0.4,
        section_type: StructureType::Breakdown,
        confidence: 0.8,
    },
    ClassificationRule {
        name: "buildup",
        predicate: |x| x.energy_variance > 0.1 && x.tempo_stability > 0.7,
        section_type: StructureType::Buildup,
        confidence: 0.7,
    },
    ClassificationRule {
        name: "chorus",
        predicate: |x| x.energy > 0.6 && x.tempo_stability > 0.6,
        section_type: StructureType::Chorus,
        confidence: 0.7,
    },
    ClassificationRule {
        name: "verse",
        predicate: |x| x.energy > 0.3 && x.energy < 0.7 && x.tempo_stability > 0.5,
        section_type: StructureType::Verse,
        confidence: 0.6,
    },
    ClassificationRule {
        name: "bridge",
        predicate: |x| x.position > 0.3 && x.position < 0.7 && x.energy > 0.4,
        section_type: StructureType::Bridge,
        confidence: 0.5,
    },
    ClassificationRule {
        name: "fallback",
        predicate: |_| true,
        section_type: StructureType::Unknown,
        confidence: 0.5,
    },
];

/// First rule matching `inputs`
pub fn match_rule(inputs: &RuleInputs) -> &'static ClassificationRule {
    RULES
        .iter()
        .find(|rule| (rule.predicate)(inputs))
        .unwrap_or(&RULES[RULES.len() - 1])
}

/// Classifies candidate segments into labeled sections
#[derive(Debug, Clone)]
pub struct SegmentClassifier {
    min_section_duration: f32,
}

impl SegmentClassifier {
    /// Create a classifier that skips segments shorter than `min_section_duration`
    pub fn new(min_section_duration: f32) -> Self {
        Self {
            min_section_duration,
        }
    }

    /// Create a classifier from structure settings
    pub fn from_config(config: &StructureConfig) -> Self {
        Self::new(config.min_section_duration)
    }

    /// Classify one segment
    pub fn classify(&self, segment: &SegmentFeatures, track_duration: f32) -> StructureSection {
        let inputs = RuleInputs::new(segment, track_duration);
        let rule = match_rule(&inputs);

        log::debug!(
            "Segment {} [{:.1}, {:.1}] s: rule {} (e={:.2}, c={:.2}, pos={:.2}, stability={:.2})",
            segment.index,
            segment.start_time,
            segment.end_time,
            rule.name,
            inputs.energy,
            inputs.centroid,
            inputs.position,
            inputs.tempo_stability
        );

        StructureSection::new(
            rule.section_type,
            segment.start_time,
            segment.end_time,
            rule.confidence,
            segment.energy_mean,
            segment.centroid_mean,
            segment.tempo_stability,
        )
    }

    /// Classify every `(start, end)` segment
    ///
    /// Segments shorter than the minimum section duration are skipped.
    pub fn classify_segments(
        &self,
        features: &FeatureSet,
        segments: &[(f32, f32)],
        track_duration: f32,
    ) -> Vec<StructureSection> {
        segments
            .iter()
            .enumerate()
            .filter(|(_, (start, end))| end - start >= self.min_section_duration)
            .map(|(index, &(start, end))| {
                let segment = SegmentFeatures::from_features(features, start, end, index);
                self.classify(&segment, track_duration)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(energy: f32, centroid: f32, position: f32, energy_variance: f32, tempo_stability: f32) -> RuleInputs {
        RuleInputs {
            energy,
            centroid,
            position,
            energy_variance,
            tempo_stability,
        }
    }

    #[test]
    fn test_classify_segments_skips_short() {
        let sr = 8000;
        let samples: Vec<f32> = (0..sr * 20)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr as f32).sin())
            .collect();
        let features = crate::features::FeatureExtractor::new(512, 2048)
            .extract(&samples, sr as u32)
            .unwrap();

        let sections = SegmentClassifier::new(8.0).classify_segments(&features, &[(0.0, 2.0), (2.0, 20.0)], 20.0);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].start_time, 2.0);
        assert_eq!(sections[0].end_time, 20.0);
    }

    #[test]
    fn test_each_rule_reachable() {
        let cases = [
            (inputs(0.2, 0.5, 0.05, 0.0, 0.0), StructureType::Intro),
            (inputs(0.2, 0.5, 0.9, 0.0, 0.0), StructureType::Outro),
            (inputs(0.9, 0.8, 0.5, 0.0, 0.0), StructureType::Drop),
            (inputs(0.2, 0.2, 0.5, 0.0, 0.0), StructureType::Breakdown),
            (inputs(0.5, 0.5, 0.5, 0.2, 0.8), StructureType::Buildup),
            (inputs(0.65, 0.5, 0.5, 0.0, 0.65), StructureType::Chorus),
            (inputs(0.5, 0.5, 0.5, 0.0, 0.55), StructureType::Verse),
            (inputs(0.5, 0.5, 0.5, 0.0, 0.0), StructureType::Bridge),
            (inputs(0.5, 0.5, 0.9, 0.0, 0.0), StructureType::Unknown),
        ];
        for (x, expected) in cases {
            assert_eq!(match_rule(&x).section_type, expected, "{:?}", x);
        }
    }

    #[test]
    fn test_first_match_wins() {
        // Matches both intro and breakdown
        let rule = match_rule(&inputs(0.1, 0.1, 0.0, 0.0, 0.0));
        assert_eq!(rule.name, "intro");
        assert_eq!(rule.confidence, 0.8);
    }

    #[test]
    fn test_rule_confidences() {
        let confidences: Vec<f32> = RULES.iter().map(|r| r.confidence).collect();
        assert_eq!(confidences, vec![0.8, 0.8, 0.9, 0.8, 0.7, 0.7, 0.6, 0.5, 0.5]);
    }

    #[test]
    fn test_stability_too_short() {
        assert_eq!(tempo_stability(&[1.0; 9]), 0.0);
    }

    #[test]
    fn test_stability_regular_pulses() {
        let onset: Vec<f32> = (0..400).map(|i| if i % 20 == 0 { 1.0 } else { 0.0 }).collect();
        let stability = tempo_stability(&onset);
        assert!(stability > 0.9, "stability {}", stability);
    }

    #[test]
    fn test_stability_flat_envelope() {
        // No interior peaks: falls back to 1 - std/mean of a constant envelope
        assert!((tempo_stability(&[2.0; 50]) - 1.0).abs() < 1e-5);
        assert_eq!(tempo_stability(&[0.0; 50]), 0.0);
    }

    #[test]
    fn test_stability_bounded() {
        let onset: Vec<f32> = (0..300).map(|i| ((i * 7919) % 13) as f32).collect();
        let stability = tempo_stability(&onset);
        assert!((0.0..=1.0).contains(&stability));
    }

    #[test]
    fn test_energy_and_centroid_scaling() {
        let segment = SegmentFeatures {
            start_time: 30.0,
            end_time: 60.0,
            index: 1,
            energy_mean: 0.5,
            energy_variance: 0.0,
            centroid_mean: 2000.0,
            centroid_variance: 0.0,
            tempo_stability: 0.0,
        };
        let x = RuleInputs::new(&segment, 120.0);
        assert_eq!(x.energy, 1.0);
        assert_eq!(x.centroid, 0.5);
        assert_eq!(x.position, 0.25);
    }
}
