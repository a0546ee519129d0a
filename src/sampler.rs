// src/sampler.rs
//
// Drives the tick cadence: latest frame → detector → geometry/ranking/
// composition/debounce → speech queue. Everything between the transport
// call and the enqueue runs synchronously inside the tick.

use crate::composer;
use crate::debounce::{AlertDebouncer, AlertDecision};
use crate::detector_client::DetectorClient;
use crate::frame_source::FrameSlot;
use crate::metrics::PipelineMetrics;
use crate::ranking;
use crate::speech::SpeechChannel;
use crate::types::{RankingConfig, SamplingConfig, Warning};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const SUMMARY_MAX_DANGERS: usize = 3;

/// Minimum-spacing gate between processed ticks. Passing arms the gate;
/// skipped polls (no frame, not yet due) leave it untouched.
pub struct TickGate {
    interval: f64,
    last_processed: Option<f64>,
}

impl TickGate {
    pub fn new(interval_sec: f64) -> Self {
        Self {
            interval: interval_sec,
            last_processed: None,
        }
    }

    pub fn try_pass(&mut self, now: f64) -> bool {
        match self.last_processed {
            Some(last) if now - last < self.interval => false,
            _ => {
                self.last_processed = Some(now);
                true
            }
        }
    }
}

/// Log every transport error for the first 3, then every 10th
pub fn should_log_error(consecutive: u64) -> bool {
    consecutive <= 3 || consecutive % 10 == 0
}

pub struct SamplingLoop {
    sampling: SamplingConfig,
    ranking: RankingConfig,
    detector: DetectorClient,
    debouncer: AlertDebouncer,
    slot: FrameSlot,
    metrics: PipelineMetrics,
    started: Instant,
}

impl SamplingLoop {
    pub fn new(
        sampling: SamplingConfig,
        ranking: RankingConfig,
        detector: DetectorClient,
        debouncer: AlertDebouncer,
        slot: FrameSlot,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            sampling,
            ranking,
            detector,
            debouncer,
            slot,
            metrics,
            started: Instant::now(),
        }
    }

    /// Monotonic seconds since the loop was built; also the clock the
    /// debouncer sees
    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub async fn run(mut self, speech: &SpeechChannel, cancel: CancellationToken) {
        info!(
            "Sampling loop started (tick every {:.1}s)",
            self.sampling.frame_interval_sec
        );

        let poll = Duration::from_secs_f64(self.sampling.poll_interval_sec);
        let mut gate = TickGate::new(self.sampling.frame_interval_sec);
        let mut consecutive_errors: u64 = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(poll) => {}
            }

            // Tick timestamp is sampled here, before the transport
            // call, so a slow detector cannot skew the debounce clock
            let now = self.now();

            // Never block waiting for a frame
            let Some(frame) = self.slot.latest() else {
                continue;
            };
            if !gate.try_pass(now) {
                continue;
            }

            self.metrics.inc(&self.metrics.ticks_processed);

            let analysis = match self.detector.analyze_frame(&frame).await {
                Ok(analysis) => {
                    if consecutive_errors > 0 {
                        debug!("Detector recovered after {} errors", consecutive_errors);
                    }
                    consecutive_errors = 0;
                    analysis
                }
                Err(e) => {
                    consecutive_errors += 1;
                    self.metrics.inc(&self.metrics.detector_errors);
                    if should_log_error(consecutive_errors) {
                        warn!("Detector error (#{}): {:#}", consecutive_errors, e);
                    }
                    // Skip the tick; alert state is untouched
                    continue;
                }
            };

            if let Some(latency) = analysis.latency_ms {
                self.metrics.set_latency(latency);
            }
            if let Some(caption) = &analysis.caption {
                debug!("Detector caption: {}", caption);
            }

            if !analysis.hazards.is_empty() {
                self.metrics.inc(&self.metrics.hazard_ticks);
                self.metrics
                    .add(&self.metrics.hazards_reported, analysis.hazards.len() as u64);
                if analysis.hazards.len() > 1 {
                    info!(
                        "Hazards: {}",
                        ranking::summary(&analysis.hazards, &self.ranking, SUMMARY_MAX_DANGERS)
                    );
                }
            }

            let warning =
                ranking::choose_primary(&analysis.hazards, &self.ranking).map(|hazard| Warning {
                    text: composer::compose(hazard),
                    hazard: hazard.clone(),
                });

            match self.debouncer.tick(warning, now) {
                AlertDecision::Emit(w) => {
                    info!("🔊 {}", w.text);
                    self.metrics.inc(&self.metrics.warnings_spoken);
                    speech.enqueue(w.text);
                }
                AlertDecision::Suppress => {
                    self.metrics.inc(&self.metrics.warnings_suppressed);
                }
                AlertDecision::Idle => {}
            }
        }

        info!("Sampling loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_gate_first_pass_is_free() {
        let mut gate = TickGate::new(6.0);
        assert!(gate.try_pass(0.0));
    }

    #[test]
    fn test_tick_gate_enforces_spacing() {
        let mut gate = TickGate::new(6.0);
        assert!(gate.try_pass(10.0));
        assert!(!gate.try_pass(12.0));
        assert!(!gate.try_pass(15.9));
        assert!(gate.try_pass(16.0));
    }

    #[test]
    fn test_tick_gate_skips_do_not_rearm() {
        let mut gate = TickGate::new(6.0);
        assert!(gate.try_pass(0.0));
        // A failed pass must not push the window forward
        assert!(!gate.try_pass(5.0));
        assert!(gate.try_pass(6.0));
    }

    #[test]
    fn test_error_log_decimation() {
        let logged: Vec<u64> = (1..=30).filter(|n| should_log_error(*n)).collect();
        assert_eq!(logged, vec![1, 2, 3, 10, 20, 30]);
    }
}
