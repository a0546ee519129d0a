// src/debounce.rs
//
// Decides whether a composed warning is actually vocalized right now,
// suppressed as a repeat, or starts a new episode. Holds the only
// mutable state in the pipeline.

use crate::types::{AlertConfig, Hazard, Warning};
use tracing::debug;

/// Per-stream alert state. Created once at stream start and mutated
/// only by `AlertDebouncer::tick`.
#[derive(Debug, Clone)]
pub struct AlertState {
    /// True while hazards are continuously reported
    pub episode_active: bool,
    /// Last hazard actually vocalized
    pub last_spoken_hazard: Option<Hazard>,
    /// Monotonic seconds; never decreases over the state's lifetime
    pub last_spoken_at: f64,
}

impl AlertState {
    fn new() -> Self {
        Self {
            episode_active: false,
            last_spoken_hazard: None,
            last_spoken_at: 0.0,
        }
    }
}

#[derive(Debug)]
pub enum AlertDecision {
    /// Speak this warning now
    Emit(Warning),
    /// Similar danger already warned about recently
    Suppress,
    /// Nothing to report this tick
    Idle,
}

pub struct AlertDebouncer {
    state: AlertState,
    min_repeat_interval: f64,
    distance_tolerance: f32,
    category_ordinals: [f32; 4],
}

impl AlertDebouncer {
    pub fn new(config: &AlertConfig, category_ordinals: [f32; 4]) -> Self {
        Self {
            state: AlertState::new(),
            min_repeat_interval: config.min_repeat_interval_sec,
            distance_tolerance: config.distance_tolerance,
            category_ordinals,
        }
    }

    /// Advance the state machine by one tick. `now` is monotonic
    /// seconds sampled at tick start.
    pub fn tick(&mut self, warning: Option<Warning>, now: f64) -> AlertDecision {
        let Some(warning) = warning else {
            // A gap in detection ends the episode immediately: the next
            // hazard speaks regardless of the repeat window
            if self.state.episode_active {
                debug!("Hazard episode ended");
            }
            self.state.episode_active = false;
            return AlertDecision::Idle;
        };

        let is_repeat = self.state.episode_active
            && self
                .state
                .last_spoken_hazard
                .as_ref()
                .map_or(false, |last| self.dangers_similar(last, &warning.hazard))
            && (now - self.state.last_spoken_at) < self.min_repeat_interval;

        if is_repeat {
            debug!(
                "Suppressing repeat of '{}' ({:.1}s into {:.1}s window)",
                warning.hazard.label,
                now - self.state.last_spoken_at,
                self.min_repeat_interval
            );
            return AlertDecision::Suppress;
        }

        debug_assert!(now >= self.state.last_spoken_at);
        self.state.last_spoken_hazard = Some(warning.hazard.clone());
        self.state.last_spoken_at = now;
        self.state.episode_active = true;
        AlertDecision::Emit(warning)
    }

    /// Explicit new-session reset; the state is never torn down
    /// implicitly.
    pub fn reset(&mut self) {
        self.state = AlertState::new();
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    /// Two hazards are the same danger if label and direction match and
    /// their distances are within tolerance. Unknown distances count as
    /// similar: suppressing beats spamming.
    fn dangers_similar(&self, a: &Hazard, b: &Hazard) -> bool {
        let same_label = a.label.eq_ignore_ascii_case(&b.label);
        let same_direction = a.direction == b.direction;

        let similar_distance = match (a.distance, b.distance) {
            (Some(da), Some(db)) => {
                let delta = da.units(&self.category_ordinals) - db.units(&self.category_ordinals);
                delta.abs() < self.distance_tolerance
            }
            _ => true,
        };

        same_label && same_direction && similar_distance
    }
}
