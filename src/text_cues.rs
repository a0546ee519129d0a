// src/text_cues.rs
//
// Fallback hazard extraction from free-text captions, for detector
// backends that return a caption/warning string instead of structured
// detections. This is the only path that can yield BEHIND; geometry
// never does.

use crate::types::{Direction, Hazard, Severity};

/// Checked in order; the first keyword found in the caption wins, so
/// specific phrases come before their generic substrings.
const DANGER_KEYWORDS: &[&str] = &[
    // sharp / cutting objects
    "knife",
    "knives",
    "blade",
    "sharp edge",
    "sharp edges",
    "sharp corner",
    "sharp corners",
    "corner of the table",
    "table corner",
    "edge of the table",
    "table edge",
    "broken glass",
    // fire / heat / smoke
    "fire",
    "flame",
    "flames",
    // cables / wires
    "exposed cable",
    "exposed wire",
    "loose cable",
    "loose wire",
    "cable",
    "wire",
    // holes / gaps / stairs / obstacles
    "hole",
    "open hole",
    "pit",
    "gap",
    "stairs",
    "staircase",
    "step",
    "steps",
    "obstacle",
    "barrier",
];

/// Guess the danger's direction from basic words in the caption
pub fn extract_direction(text: &str) -> Option<Direction> {
    let t = text.to_lowercase();

    if t.contains("left") {
        Some(Direction::Left)
    } else if t.contains("right") {
        Some(Direction::Right)
    } else if t.contains("behind") || t.contains("back") {
        Some(Direction::Behind)
    } else if t.contains("front") || t.contains("ahead") {
        Some(Direction::Front)
    } else {
        None
    }
}

/// Pull a short danger keyword out of the caption
pub fn extract_keyword(text: &str) -> Option<&'static str> {
    let t = text.to_lowercase();
    DANGER_KEYWORDS.iter().find(|kw| t.contains(**kw)).copied()
}

/// Build a hazard from a caption that the backend flagged as dangerous.
/// No distance is known, so the repeat-suppression treats successive
/// caption hazards with the same label and direction as the same
/// danger.
pub fn hazard_from_caption(caption: &str) -> Hazard {
    Hazard {
        label: extract_keyword(caption).unwrap_or("danger").to_string(),
        distance: None,
        direction: extract_direction(caption).unwrap_or(Direction::Front),
        severity: Severity::Low,
    }
}
