// src/geometry.rs
//
// Maps a detection's bounding box into a qualitative distance and a
// direction sector. Pure arithmetic over the configured step tables;
// the only direction source is the box center, so BEHIND can never be
// produced here.

use crate::types::{
    Detection, Direction, Distance, DistanceCategory, DistanceMode, GeometryConfig,
};

pub struct GeometryEstimator {
    config: GeometryConfig,
}

impl GeometryEstimator {
    pub fn new(config: GeometryConfig) -> Self {
        Self { config }
    }

    /// Estimate (distance, direction) for one detection. The distance
    /// representation follows the configured mode.
    pub fn estimate(
        &self,
        detection: &Detection,
        frame_width: u32,
        frame_height: u32,
    ) -> (Distance, Direction) {
        let distance = match self.config.mode {
            DistanceMode::Categories => {
                Distance::Category(self.categorize(detection, frame_height))
            }
            DistanceMode::Meters => Distance::Meters(self.estimate_meters(detection, frame_height)),
        };
        let direction = self.direction(&detection.bbox, frame_width);
        (distance, direction)
    }

    /// LEFT / FRONT / RIGHT from the box center x. The middle third of
    /// the frame is FRONT; both exact third boundaries land there.
    pub fn direction(&self, bbox: &[f32; 4], frame_width: u32) -> Direction {
        let center_x = (bbox[0] + bbox[2]) / 2.0;
        let rel = center_x / frame_width.max(1) as f32;

        if rel < 1.0 / 3.0 {
            Direction::Left
        } else if rel > 2.0 / 3.0 {
            Direction::Right
        } else {
            Direction::Front
        }
    }

    /// Categorical distance. Small hazardous objects are ranged by box
    /// area (dangerous long before they fill the frame); everything
    /// else by relative box height, with optional per-label tables.
    pub fn categorize(&self, detection: &Detection, frame_height: u32) -> DistanceCategory {
        let box_h = (detection.bbox[3] - detection.bbox[1]).max(1.0);
        let box_w = (detection.bbox[2] - detection.bbox[0]).max(1.0);
        let rel_h = box_h / frame_height.max(1) as f32;
        let label = detection.label.to_lowercase();

        if self.is_small_object(&label) {
            let area = box_h * box_w;
            for step in &self.config.area_steps {
                if area > step.min_area {
                    return step.category;
                }
            }
            return DistanceCategory::Far;
        }

        let steps = self
            .config
            .label_height_overrides
            .get(&label)
            .unwrap_or(&self.config.height_steps);

        for step in steps {
            if rel_h >= step.min_rel_height {
                return step.category;
            }
        }
        DistanceCategory::Far
    }

    /// Rough meters from relative box height. Taller on screen means
    /// closer; tuned for person/car sized objects at chest height.
    pub fn estimate_meters(&self, detection: &Detection, frame_height: u32) -> f32 {
        let box_h = (detection.bbox[3] - detection.bbox[1]).max(1.0);
        let rel_h = box_h / frame_height.max(1) as f32;

        for step in &self.config.meter_steps {
            if rel_h >= step.min_rel_height {
                return step.meters;
            }
        }
        self.config.far_meters
    }

    /// Coerce a wire distance into the configured representation so a
    /// ranking pass never mixes the two.
    pub fn coerce(&self, distance: Distance) -> Distance {
        match (self.config.mode, distance) {
            (DistanceMode::Categories, Distance::Meters(m)) => {
                let bounds = &self.config.category_meter_bounds;
                let category = if m < bounds[0] {
                    DistanceCategory::VeryClose
                } else if m < bounds[1] {
                    DistanceCategory::Close
                } else if m < bounds[2] {
                    DistanceCategory::Near
                } else {
                    DistanceCategory::Far
                };
                Distance::Category(category)
            }
            (DistanceMode::Meters, Distance::Category(c)) => {
                Distance::Meters(self.config.category_nominal_meters[c.ordinal()])
            }
            (_, other) => other,
        }
    }

    fn is_small_object(&self, label: &str) -> bool {
        self.config
            .small_object_labels
            .iter()
            .any(|l| l.eq_ignore_ascii_case(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> GeometryEstimator {
        GeometryEstimator::new(GeometryConfig::default())
    }

    fn detection(label: &str, bbox: [f32; 4]) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: Some(0.9),
            bbox,
        }
    }

    #[test]
    fn test_direction_partition() {
        let est = estimator();
        let w = 1000;

        // Centers at relative x = 0.1 / 0.5 / 0.9
        let left = detection("car", [50.0, 0.0, 150.0, 100.0]);
        let front = detection("car", [450.0, 0.0, 550.0, 100.0]);
        let right = detection("car", [850.0, 0.0, 950.0, 100.0]);

        assert_eq!(est.direction(&left.bbox, w), Direction::Left);
        assert_eq!(est.direction(&front.bbox, w), Direction::Front);
        assert_eq!(est.direction(&right.bbox, w), Direction::Right);
    }

    #[test]
    fn test_direction_third_boundaries() {
        let est = estimator();
        let w = 900;

        // Center exactly at w/3 and 2w/3: both sit in the FRONT sector
        let at_third = [250.0, 0.0, 350.0, 100.0];
        let at_two_thirds = [550.0, 0.0, 650.0, 100.0];
        assert_eq!(est.direction(&at_third, w), Direction::Front);
        assert_eq!(est.direction(&at_two_thirds, w), Direction::Front);

        // Just across the boundaries
        let below_third = [249.0, 0.0, 349.0, 100.0];
        let above_two_thirds = [551.0, 0.0, 651.0, 100.0];
        assert_eq!(est.direction(&below_third, w), Direction::Left);
        assert_eq!(est.direction(&above_two_thirds, w), Direction::Right);
    }

    #[test]
    fn test_height_monotonicity() {
        let est = estimator();
        let frame_h = 480;

        let mut last_ordinal = usize::MAX;
        for step in 1..=47 {
            let box_h = step as f32 * 10.0;
            let det = detection("person", [100.0, 0.0, 200.0, box_h]);
            let ordinal = est.categorize(&det, frame_h).ordinal();
            // Growing box must never move the hazard farther away
            assert!(ordinal <= last_ordinal, "taller box moved farther");
            last_ordinal = ordinal;
        }
    }

    #[test]
    fn test_area_monotonicity_for_small_objects() {
        let est = estimator();
        let frame_h = 480;

        let mut last_ordinal = usize::MAX;
        for step in 1..=60 {
            let side = step as f32 * 5.0;
            let det = detection("knife", [0.0, 0.0, side, side]);
            let ordinal = est.categorize(&det, frame_h).ordinal();
            assert!(ordinal <= last_ordinal, "bigger knife moved farther");
            last_ordinal = ordinal;
        }
    }

    #[test]
    fn test_small_object_uses_area_not_height() {
        let est = estimator();
        let frame_h = 480;

        // A wide, shallow blade: tiny relative height but large area
        let blade = detection("knife", [0.0, 0.0, 700.0, 80.0]);
        assert_eq!(est.categorize(&blade, frame_h), DistanceCategory::VeryClose);

        // The same geometry as a generic object stays far by height
        let generic = detection("bag", [0.0, 0.0, 700.0, 80.0]);
        assert_eq!(est.categorize(&generic, frame_h), DistanceCategory::Far);
    }

    #[test]
    fn test_fire_override_table() {
        let est = estimator();
        let frame_h = 480;

        // rel_h = 1/3: the fire table wants >= 0.35 for CLOSE, so fire is
        // still NEAR where the default table already says CLOSE
        let fire = detection("fire", [0.0, 0.0, 50.0, 160.0]);
        assert_eq!(est.categorize(&fire, frame_h), DistanceCategory::Near);
        let box_hazard = detection("box", [0.0, 0.0, 50.0, 160.0]);
        assert_eq!(est.categorize(&box_hazard, frame_h), DistanceCategory::Close);
    }

    #[test]
    fn test_meters_mode() {
        let mut config = GeometryConfig::default();
        config.mode = DistanceMode::Meters;
        let est = GeometryEstimator::new(config);

        let near = detection("person", [0.0, 0.0, 100.0, 320.0]); // rel_h ≈ 0.67
        let far = detection("person", [0.0, 0.0, 100.0, 30.0]); // rel_h ≈ 0.06

        let (near_distance, _) = est.estimate(&near, 640, 480);
        let (far_distance, _) = est.estimate(&far, 640, 480);
        assert_eq!(near_distance, Distance::Meters(0.5));
        assert_eq!(far_distance, Distance::Meters(5.0));
    }

    #[test]
    fn test_coerce_meters_into_category() {
        let est = estimator();
        assert_eq!(
            est.coerce(Distance::Meters(0.4)),
            Distance::Category(DistanceCategory::VeryClose)
        );
        assert_eq!(
            est.coerce(Distance::Meters(2.5)),
            Distance::Category(DistanceCategory::Near)
        );
        assert_eq!(
            est.coerce(Distance::Meters(9.0)),
            Distance::Category(DistanceCategory::Far)
        );
    }

    #[test]
    fn test_coerce_category_into_meters() {
        let mut config = GeometryConfig::default();
        config.mode = DistanceMode::Meters;
        let est = GeometryEstimator::new(config);

        assert_eq!(
            est.coerce(Distance::Category(DistanceCategory::Close)),
            Distance::Meters(1.5)
        );
        // Already in the right representation: untouched
        assert_eq!(est.coerce(Distance::Meters(2.0)), Distance::Meters(2.0));
    }
}
