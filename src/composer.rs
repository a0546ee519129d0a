// src/composer.rs
//
// Renders the primary hazard into one short spoken sentence. Pure
// formatting; the output must stay safe to hand to a TTS subprocess,
// so quotes and non-ASCII are stripped up front.

use crate::types::{Direction, Distance, Hazard};

/// Render a hazard as a warning sentence, no trailing newline:
/// `Watch out, knife around 1.5 meters to your left.`
pub fn compose(hazard: &Hazard) -> String {
    let sanitized = sanitize(&hazard.label);
    let label = if sanitized.is_empty() {
        "danger"
    } else {
        sanitized.as_str()
    };

    let direction_phrase = match hazard.direction {
        Direction::Front => "ahead",
        Direction::Behind => "behind you",
        Direction::Left => "to your left",
        Direction::Right => "to your right",
    };

    let qualifier = match hazard.distance {
        Some(Distance::Meters(m)) if m > 0.0 => Some(format!("around {:.1} meters", m)),
        Some(Distance::Category(c)) => Some(c.spoken().to_string()),
        // Unknown or non-positive distance: say nothing rather than
        // a misleading "0 meters"
        _ => None,
    };

    match qualifier {
        Some(q) => format!("Watch out, {} {} {}.", label, q, direction_phrase),
        None => format!("Watch out, {} {}.", label, direction_phrase),
    }
}

/// Keep the text shell- and TTS-safe: quotes out, ASCII only,
/// whitespace collapsed
fn sanitize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii() && *c != '\'' && *c != '"' && *c != '`')
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
