// src/ranking.rs
//
// Orders one tick's hazards by urgency and picks the single primary
// hazard to report. Severity dominates moderate distance differences;
// a closeness sort is kept separately for the logged summary, and the
// two orderings are allowed to disagree.

use crate::types::{Distance, Hazard, RankingConfig};

/// Distance of a hazard in ranking units. Hazards with no distance at
/// all get the configured default rather than failing the pass.
pub fn distance_value(hazard: &Hazard, config: &RankingConfig) -> f32 {
    hazard
        .distance
        .map(|d| d.units(&config.category_ordinals))
        .unwrap_or(config.default_distance_value)
}

/// Higher = more urgent: closer and more severe
pub fn urgency_score(hazard: &Hazard, config: &RankingConfig) -> f32 {
    hazard.severity.weight() * config.severity_scale - distance_value(hazard, config)
}

/// Pick the most urgent hazard, or None for an empty tick.
///
/// Ties break toward the first-listed hazard: the input order carries
/// the detector's own confidence ordering, so it is meaningful.
pub fn choose_primary<'a>(hazards: &'a [Hazard], config: &RankingConfig) -> Option<&'a Hazard> {
    let mut best: Option<(&'a Hazard, f32)> = None;

    for hazard in hazards {
        let score = urgency_score(hazard, config);
        match &best {
            Some((_, best_score)) if score <= *best_score => {}
            _ => best = Some((hazard, score)),
        }
    }

    best.map(|(hazard, _)| hazard)
}

/// Stable closest-first ordering for display and logging
pub fn sort_by_closeness(hazards: &mut [Hazard], config: &RankingConfig) {
    hazards.sort_by(|a, b| {
        distance_value(a, config)
            .partial_cmp(&distance_value(b, config))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Compact one-line summary of a tick's hazards, closest first:
/// `1) knife - VERY CLOSE - LEFT ; 2) car - NEAR - RIGHT`
pub fn summary(hazards: &[Hazard], config: &RankingConfig, max_dangers: usize) -> String {
    let mut sorted = hazards.to_vec();
    sort_by_closeness(&mut sorted, config);

    let parts: Vec<String> = sorted
        .iter()
        .take(max_dangers)
        .enumerate()
        .map(|(idx, h)| {
            let distance = match h.distance {
                Some(Distance::Category(c)) => c.as_str().to_string(),
                Some(Distance::Meters(m)) => format!("{:.1} m", m),
                None => "?".to_string(),
            };
            format!(
                "{}) {} - {} - {}",
                idx + 1,
                h.label,
                distance,
                h.direction.as_str().to_uppercase()
            )
        })
        .collect();

    parts.join(" ; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, DistanceCategory, Severity};

    fn hazard(label: &str, severity: Severity, meters: Option<f32>) -> Hazard {
        Hazard {
            label: label.to_string(),
            distance: meters.map(Distance::Meters),
            direction: Direction::Front,
            severity,
        }
    }

    #[test]
    fn test_severity_dominates_distance() {
        let config = RankingConfig::default();
        let hazards = vec![
            hazard("puddle", Severity::Low, Some(1.0)),
            hazard("car", Severity::High, Some(4.0)),
        ];

        let primary = choose_primary(&hazards, &config).unwrap();
        assert_eq!(primary.label, "car");
    }

    #[test]
    fn test_exact_tie_first_listed_wins() {
        let config = RankingConfig::default();
        let hazards = vec![
            hazard("stairs", Severity::Medium, Some(1.0)),
            hazard("pole", Severity::Medium, Some(1.0)),
        ];

        let primary = choose_primary(&hazards, &config).unwrap();
        assert_eq!(primary.label, "stairs");
    }

    #[test]
    fn test_empty_tick_has_no_primary() {
        let config = RankingConfig::default();
        assert!(choose_primary(&[], &config).is_none());
    }

    #[test]
    fn test_missing_distance_uses_default_value() {
        let config = RankingConfig::default();
        // Same severity: the hazard with an unknown distance (3.0 by
        // default) loses to one known to be nearer
        let hazards = vec![
            hazard("shadow", Severity::Low, None),
            hazard("bike", Severity::Low, Some(1.0)),
        ];

        let primary = choose_primary(&hazards, &config).unwrap();
        assert_eq!(primary.label, "bike");
    }

    #[test]
    fn test_closeness_sort_uses_category_order() {
        let config = RankingConfig::default();
        let mut hazards = vec![
            Hazard {
                label: "car".to_string(),
                distance: Some(Distance::Category(DistanceCategory::Far)),
                direction: Direction::Right,
                severity: Severity::High,
            },
            Hazard {
                label: "knife".to_string(),
                distance: Some(Distance::Category(DistanceCategory::VeryClose)),
                direction: Direction::Left,
                severity: Severity::Low,
            },
        ];

        sort_by_closeness(&mut hazards, &config);
        assert_eq!(hazards[0].label, "knife");
        assert_eq!(hazards[1].label, "car");
    }

    #[test]
    fn test_summary_format() {
        let config = RankingConfig::default();
        let hazards = vec![
            Hazard {
                label: "car".to_string(),
                distance: Some(Distance::Category(DistanceCategory::Near)),
                direction: Direction::Right,
                severity: Severity::High,
            },
            Hazard {
                label: "knife".to_string(),
                distance: Some(Distance::Category(DistanceCategory::VeryClose)),
                direction: Direction::Left,
                severity: Severity::Low,
            },
        ];

        let line = summary(&hazards, &config, 3);
        assert_eq!(line, "1) knife - VERY CLOSE - LEFT ; 2) car - NEAR - RIGHT");
    }
}
