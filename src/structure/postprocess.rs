//! Structure post-processing
//!
//! Three passes over classified sections:
//! 1. Merge: segments shorter than half the minimum section duration join the
//!    previous section when the types match, otherwise they are dropped
//! 2. Heuristics: short quiet opener → INTRO, quiet closer → OUTRO, loud section
//!    after a BUILDUP → DROP
//! 3. Gap filling: UNKNOWN placeholders cover every uncovered interval, so the
//!    result spans `[0, duration]` exactly

use crate::analysis::result::{StructureSection, StructureType};
use crate::config::StructureConfig;

/// Gaps shorter than this are closed by snapping instead of filled
const GAP_TOLERANCE: f32 = 1e-3;

/// Longest opener that can be relabeled INTRO, in seconds
const INTRO_MAX_SECONDS: f32 = 30.0;

/// Raw energy below which the opener is relabeled INTRO
const INTRO_MAX_ENERGY: f32 = 0.5;

/// Raw energy below which the closer is relabeled OUTRO
const OUTRO_MAX_ENERGY: f32 = 0.4;

/// Raw energy above which a section after a BUILDUP becomes a DROP
const DROP_MIN_ENERGY: f32 = 0.7;

/// Placeholder section covering an unclassified interval
pub fn placeholder_section(start_time: f32, end_time: f32) -> StructureSection {
    StructureSection::new(StructureType::Unknown, start_time, end_time, 0.1, 0.5, 1000.0, 0.5)
}

/// Merges, relabels and gap-fills classified sections
#[derive(Debug, Clone)]
pub struct StructurePostProcessor {
    min_section_duration: f32,
}

impl StructurePostProcessor {
    /// Create a post-processor
    pub fn new(min_section_duration: f32) -> Self {
        Self {
            min_section_duration,
        }
    }

    /// Create a post-processor from structure settings
    pub fn from_config(config: &StructureConfig) -> Self {
        Self::new(config.min_section_duration)
    }

    /// Run all passes
    ///
    /// The result is sorted, non-overlapping and covers `[0, duration]` exactly.
    pub fn process(&self, mut sections: Vec<StructureSection>, duration: f32) -> Vec<StructureSection> {
        sections.sort_by(|a, b| {
            a.start_time
                .partial_cmp(&b.start_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut sections = self.merge_short(sections);
        apply_heuristics(&mut sections);
        fill_gaps(sections, duration)
    }

    /// Merge pass
    pub fn merge_short(&self, sections: Vec<StructureSection>) -> Vec<StructureSection> {
        let min = self.min_section_duration / 2.0;
        let mut merged: Vec<StructureSection> = Vec::with_capacity(sections.len());
        for section in sections {
            if section.duration() >= min {
                merged.push(section);
                continue;
            }
            match merged.last_mut() {
                Some(previous) if previous.section_type == section.section_type => {
                    previous.end_time = previous.end_time.max(section.end_time);
                }
                _ => log::debug!(
                    "Dropping short {} section [{:.2}, {:.2}]",
                    section.section_type,
                    section.start_time,
                    section.end_time
                ),
            }
        }
        merged
    }
}

/// Track-position heuristics, applied once in order (only with ≥ 2 sections)
pub fn apply_heuristics(sections: &mut [StructureSection]) {
    if sections.len() < 2 {
        return;
    }

    let first = &mut sections[0];
    if first.duration() < INTRO_MAX_SECONDS && first.energy_level < INTRO_MAX_ENERGY {
        let confidence = (first.confidence + 0.2).min(0.8);
        first.retype(StructureType::Intro, confidence);
    }

    let last_index = sections.len() - 1;
    let last = &mut sections[last_index];
    if last.energy_level < OUTRO_MAX_ENERGY {
        let confidence = (last.confidence + 0.2).min(0.8);
        last.retype(StructureType::Outro, confidence);
    }

    for i in 1..sections.len() {
        if sections[i - 1].section_type == StructureType::Buildup && sections[i].energy_level > DROP_MIN_ENERGY {
            let confidence = (sections[i].confidence + 0.3).min(0.9);
            sections[i].retype(StructureType::Drop, confidence);
        }
    }
}

/// Gap-filling pass: clip to `[0, duration]`, resolve overlaps, insert placeholders
pub fn fill_gaps(sections: Vec<StructureSection>, duration: f32) -> Vec<StructureSection> {
    let duration = duration.max(0.0);
    let mut filled: Vec<StructureSection> = Vec::with_capacity(sections.len() * 2 + 1);
    let mut cursor = 0.0f32;

    for mut section in sections {
        section.start_time = section.start_time.max(cursor);
        section.end_time = section.end_time.min(duration);
        if section.end_time - section.start_time <= GAP_TOLERANCE {
            continue;
        }
        if section.start_time - cursor > GAP_TOLERANCE {
            filled.push(placeholder_section(cursor, section.start_time));
        } else {
            section.start_time = cursor;
        }
        cursor = section.end_time;
        filled.push(section);
    }

    if duration - cursor > GAP_TOLERANCE || filled.is_empty() {
        filled.push(placeholder_section(cursor, duration));
    } else if let Some(last) = filled.last_mut() {
        last.end_time = duration;
    }

    filled
}
