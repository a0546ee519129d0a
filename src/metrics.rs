// src/metrics.rs
//
// Pipeline counters. Cheap atomics, shared by handle, summarized once
// at shutdown or whenever an operator asks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub ticks_processed: Arc<AtomicU64>,
    pub detector_errors: Arc<AtomicU64>,
    pub hazard_ticks: Arc<AtomicU64>,
    pub hazards_reported: Arc<AtomicU64>,
    pub warnings_spoken: Arc<AtomicU64>,
    pub warnings_suppressed: Arc<AtomicU64>,
    pub detector_latency_ms: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            ticks_processed: Arc::new(AtomicU64::new(0)),
            detector_errors: Arc::new(AtomicU64::new(0)),
            hazard_ticks: Arc::new(AtomicU64::new(0)),
            hazards_reported: Arc::new(AtomicU64::new(0)),
            warnings_spoken: Arc::new(AtomicU64::new(0)),
            warnings_suppressed: Arc::new(AtomicU64::new(0)),
            detector_latency_ms: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn set_latency(&self, latency_ms: f64) {
        self.detector_latency_ms
            .store(latency_ms.max(0.0) as u64, Ordering::Relaxed);
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            ticks_processed: self.ticks_processed.load(Ordering::Relaxed),
            detector_errors: self.detector_errors.load(Ordering::Relaxed),
            hazard_ticks: self.hazard_ticks.load(Ordering::Relaxed),
            hazards_reported: self.hazards_reported.load(Ordering::Relaxed),
            warnings_spoken: self.warnings_spoken.load(Ordering::Relaxed),
            warnings_suppressed: self.warnings_suppressed.load(Ordering::Relaxed),
            last_detector_latency_ms: self.detector_latency_ms.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub ticks_processed: u64,
    pub detector_errors: u64,
    pub hazard_ticks: u64,
    pub hazards_reported: u64,
    pub warnings_spoken: u64,
    pub warnings_suppressed: u64,
    pub last_detector_latency_ms: u64,
    pub elapsed_secs: f64,
}
