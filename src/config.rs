// src/config.rs

use crate::types::{AreaStep, CategoryStep, Config, MeterStep};
use anyhow::{bail, Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would break pipeline invariants.
    /// The step tables in particular must stay monotonic: a larger
    /// relative height or area may never map to a farther distance.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.frame_interval_sec <= 0.0 {
            bail!("sampling.frame_interval_sec must be positive");
        }
        if self.sampling.poll_interval_sec <= 0.0 {
            bail!("sampling.poll_interval_sec must be positive");
        }
        if self.detector.request_timeout_sec <= 0.0 {
            bail!("detector.request_timeout_sec must be positive");
        }
        if self.alerts.min_repeat_interval_sec < 0.0 {
            bail!("alerts.min_repeat_interval_sec must not be negative");
        }
        if self.alerts.distance_tolerance <= 0.0 {
            bail!("alerts.distance_tolerance must be positive");
        }
        if self.ranking.severity_scale <= 0.0 {
            bail!("ranking.severity_scale must be positive");
        }

        let ords = &self.ranking.category_ordinals;
        if ords.windows(2).any(|w| w[0] > w[1]) {
            bail!("ranking.category_ordinals must be non-decreasing");
        }

        validate_category_steps("geometry.height_steps", &self.geometry.height_steps)?;
        validate_area_steps("geometry.area_steps", &self.geometry.area_steps)?;
        for (label, steps) in &self.geometry.label_height_overrides {
            validate_category_steps(
                &format!("geometry.label_height_overrides[{}]", label),
                steps,
            )?;
        }
        validate_meter_steps("geometry.meter_steps", &self.geometry.meter_steps)?;

        let bounds = &self.geometry.category_meter_bounds;
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            bail!("geometry.category_meter_bounds must be strictly increasing");
        }
        let nominal = &self.geometry.category_nominal_meters;
        if nominal.windows(2).any(|w| w[0] >= w[1]) {
            bail!("geometry.category_nominal_meters must be strictly increasing");
        }

        if self.frames.fps <= 0.0 {
            bail!("frames.fps must be positive");
        }
        if self.frames.width == 0 || self.frames.height == 0 {
            bail!("frames.width and frames.height must be positive");
        }

        Ok(())
    }
}

fn validate_category_steps(name: &str, steps: &[CategoryStep]) -> Result<()> {
    if steps.is_empty() {
        bail!("{} must not be empty", name);
    }
    for w in steps.windows(2) {
        if w[0].min_rel_height <= w[1].min_rel_height {
            bail!("{} thresholds must be strictly decreasing", name);
        }
        if w[0].category.ordinal() >= w[1].category.ordinal() {
            bail!("{} categories must go nearest to farthest", name);
        }
    }
    Ok(())
}

fn validate_area_steps(name: &str, steps: &[AreaStep]) -> Result<()> {
    if steps.is_empty() {
        bail!("{} must not be empty", name);
    }
    for w in steps.windows(2) {
        if w[0].min_area <= w[1].min_area {
            bail!("{} thresholds must be strictly decreasing", name);
        }
        if w[0].category.ordinal() >= w[1].category.ordinal() {
            bail!("{} categories must go nearest to farthest", name);
        }
    }
    Ok(())
}

fn validate_meter_steps(name: &str, steps: &[MeterStep]) -> Result<()> {
    if steps.is_empty() {
        bail!("{} must not be empty", name);
    }
    for w in steps.windows(2) {
        if w[0].min_rel_height <= w[1].min_rel_height {
            bail!("{} thresholds must be strictly decreasing", name);
        }
        if w[0].meters > w[1].meters {
            bail!("{} meters must be non-decreasing", name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DistanceCategory;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.sampling.frame_interval_sec, 6.0);
        assert_eq!(config.alerts.min_repeat_interval_sec, 8.0);
    }

    #[test]
    fn test_non_monotonic_height_steps_rejected() {
        let mut config = Config::default();
        // Taller box mapped to a farther category: must be rejected
        config.geometry.height_steps = vec![
            CategoryStep {
                min_rel_height: 0.5,
                category: DistanceCategory::Near,
            },
            CategoryStep {
                min_rel_height: 0.2,
                category: DistanceCategory::Close,
            },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_frame_interval_rejected() {
        let mut config = Config::default();
        config.sampling.frame_interval_sec = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = "alerts:\n  min_repeat_interval_sec: 2.5\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.alerts.min_repeat_interval_sec, 2.5);
        assert_eq!(config.alerts.distance_tolerance, 0.7);
    }
}
