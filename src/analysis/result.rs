//! Analysis result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Time signature of a beatgrid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u32,
    /// Note value of one beat
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo breakpoint within a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    /// Time of the change in seconds
    pub time: f32,
    /// Tempo from this point on
    pub bpm: f32,
}

/// Beatgrid of one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatgridResult {
    /// Tempo in BPM
    pub bpm: f32,

    /// Confidence (0.0-1.0)
    pub confidence: f32,

    /// Beat times in seconds, ascending, within the track
    pub beats: Vec<f32>,

    /// Downbeat times in seconds (subset of `beats`)
    pub downbeats: Vec<f32>,

    /// Assumed time signature (always 4/4)
    pub time_signature: TimeSignature,

    /// Tempo breakpoints (not detected; always empty)
    pub tempo_changes: Vec<TempoChange>,

    /// Beat tracking algorithm that produced the grid, or "manual"
    pub algorithm: String,

    /// Wall-clock analysis time in seconds
    pub analysis_time: f32,

    /// True when the grid was synthesized from manual input
    pub manual_override: bool,
}

impl BeatgridResult {
    /// Seconds per beat at the grid tempo
    pub fn beat_interval(&self) -> f32 {
        60.0 / self.bpm
    }

    /// First beat time, if any
    pub fn first_beat(&self) -> Option<f32> {
        self.beats.first().copied()
    }
}

/// Musical role of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureType {
    /// Opening section
    Intro,
    /// Verse
    Verse,
    /// Chorus
    Chorus,
    /// Bridge
    Bridge,
    /// Low-energy breakdown
    Breakdown,
    /// Rising build-up before a drop
    Buildup,
    /// High-energy drop
    Drop,
    /// Closing section
    Outro,
    /// Unclassified
    Unknown,
}

impl StructureType {
    /// All section types
    pub const ALL: [StructureType; 9] = [
        StructureType::Intro,
        StructureType::Verse,
        StructureType::Chorus,
        StructureType::Bridge,
        StructureType::Breakdown,
        StructureType::Buildup,
        StructureType::Drop,
        StructureType::Outro,
        StructureType::Unknown,
    ];

    /// Lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureType::Intro => "intro",
            StructureType::Verse => "verse",
            StructureType::Chorus => "chorus",
            StructureType::Bridge => "bridge",
            StructureType::Breakdown => "breakdown",
            StructureType::Buildup => "buildup",
            StructureType::Drop => "drop",
            StructureType::Outro => "outro",
            StructureType::Unknown => "unknown",
        }
    }

    /// Display color as `#RRGGBB`
    pub fn default_color(&self) -> &'static str {
        match self {
            StructureType::Intro => "#4A90E2",
            StructureType::Verse => "#7ED321",
            StructureType::Chorus => "#F5A623",
            StructureType::Bridge => "#9013FE",
            StructureType::Breakdown => "#50E3C2",
            StructureType::Buildup => "#BD10E0",
            StructureType::Drop => "#FF3366",
            StructureType::Outro => "#B8E986",
            StructureType::Unknown => "#888888",
        }
    }

    /// Display label (identifier in title case)
    ///
    /// # Example
    ///
    /// ```
    /// use cuepoint_dsp::analysis::result::StructureType;
    ///
    /// assert_eq!(StructureType::Breakdown.default_label(), "Breakdown");
    /// ```
    pub fn default_label(&self) -> String {
        let id = self.as_str();
        let mut chars = id.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled section of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSection {
    /// Section role
    #[serde(rename = "type")]
    pub section_type: StructureType,

    /// Start time in seconds
    pub start_time: f32,

    /// End time in seconds (> start)
    pub end_time: f32,

    /// Classification confidence (0.0-1.0)
    pub confidence: f32,

    /// Mean RMS energy over the section
    pub energy_level: f32,

    /// Mean spectral centroid over the section in Hz
    pub spectral_centroid: f32,

    /// Tempo stability score (0.0-1.0)
    pub tempo_stability: f32,

    /// Display label
    pub label: String,

    /// Display color as `#RRGGBB`
    pub color: String,
}

impl StructureSection {
    /// Create a section with the type's default label and color
    pub fn new(
        section_type: StructureType,
        start_time: f32,
        end_time: f32,
        confidence: f32,
        energy_level: f32,
        spectral_centroid: f32,
        tempo_stability: f32,
    ) -> Self {
        Self {
            section_type,
            start_time,
            end_time,
            confidence,
            energy_level,
            spectral_centroid,
            tempo_stability,
            label: section_type.default_label(),
            color: section_type.default_color().to_string(),
        }
    }

    /// Replace the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Replace the display color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Change the section type, resetting label and color to the new type's defaults
    pub fn retype(&mut self, section_type: StructureType, confidence: f32) {
        self.section_type = section_type;
        self.confidence = confidence;
        self.label = section_type.default_label();
        self.color = section_type.default_color().to_string();
    }

    /// Length in seconds
    pub fn duration(&self) -> f32 {
        self.end_time - self.start_time
    }

    /// True if `time` lies within `[start, end]`
    pub fn contains(&self, time: f32) -> bool {
        self.start_time <= time && time <= self.end_time
    }
}

/// Structure map of one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysisResult {
    /// Contiguous sections covering the whole track, sorted by start time
    pub sections: Vec<StructureSection>,

    /// Mean section confidence
    pub confidence: f32,

    /// Wall-clock analysis time in seconds
    pub analysis_time: f32,

    /// Segmentation algorithm tag
    pub algorithm: String,

    /// Names of the features extracted for the analysis
    pub features_used: Vec<String>,
}

impl StructureAnalysisResult {
    /// First section containing `time`
    pub fn section_at(&self, time: f32) -> Option<&StructureSection> {
        self.sections.iter().find(|s| s.contains(time))
    }

    /// All sections of one type, in order
    pub fn sections_by_type(&self, section_type: StructureType) -> Vec<&StructureSection> {
        self.sections
            .iter()
            .filter(|s| s.section_type == section_type)
            .collect()
    }

    /// End time of the last section
    pub fn duration(&self) -> f32 {
        self.sections.last().map(|s| s.end_time).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_labels_and_colors() {
        assert_eq!(StructureType::Intro.default_label(), "Intro");
        assert_eq!(StructureType::Unknown.default_color(), "#888888");
        assert_eq!(StructureType::Drop.to_string(), "drop");
        assert!(StructureType::ALL.iter().all(|t| t.default_color().len() == 7));
    }

    #[test]
    fn test_section_builders() {
        let section = StructureSection::new(StructureType::Chorus, 10.0, 30.0, 0.7, 0.2, 2000.0, 0.8)
            .with_label("Hook")
            .with_color("#000000");
        assert_eq!(section.label, "Hook");
        assert_eq!(section.color, "#000000");
        assert_eq!(section.duration(), 20.0);
    }

    #[test]
    fn test_retype_resets_defaults() {
        let mut section = StructureSection::new(StructureType::Verse, 0.0, 10.0, 0.6, 0.1, 900.0, 0.5)
            .with_label("Custom");
        section.retype(StructureType::Intro, 0.8);
        assert_eq!(section.label, "Intro");
        assert_eq!(section.color, "#4A90E2");
        assert_eq!(section.confidence, 0.8);
    }

    #[test]
    fn test_section_lookup() {
        let result = StructureAnalysisResult {
            sections: vec![
                StructureSection::new(StructureType::Intro, 0.0, 10.0, 0.8, 0.1, 500.0, 0.5),
                StructureSection::new(StructureType::Drop, 10.0, 20.0, 0.9, 0.5, 3000.0, 0.9),
                StructureSection::new(StructureType::Intro, 20.0, 30.0, 0.8, 0.1, 500.0, 0.5),
            ],
            confidence: 0.83,
            analysis_time: 0.1,
            algorithm: "agglomerative_segmentation".to_string(),
            features_used: vec![],
        };
        assert_eq!(result.section_at(15.0).map(|s| s.section_type), Some(StructureType::Drop));
        assert_eq!(result.section_at(10.0).map(|s| s.section_type), Some(StructureType::Intro));
        assert!(result.section_at(31.0).is_none());
        assert_eq!(result.sections_by_type(StructureType::Intro).len(), 2);
        assert_eq!(result.duration(), 30.0);
    }

    #[test]
    fn test_serde_type_ids() {
        let section = StructureSection::new(StructureType::Buildup, 0.0, 1.0, 0.7, 0.0, 0.0, 0.0);
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["type"], "buildup");
        assert_eq!(json["color"], "#BD10E0");
    }
}
