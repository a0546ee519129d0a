// src/main.rs

mod composer;
mod config;
mod debounce;
mod detector_client;
mod frame_source;
mod geometry;
mod metrics;
mod ranking;
mod sampler;
mod speech;
mod text_cues;
mod types;

use anyhow::Result;
use debounce::AlertDebouncer;
use detector_client::DetectorClient;
use frame_source::{DirectoryFrameSource, FrameSlot};
use geometry::GeometryEstimator;
use metrics::PipelineMetrics;
use sampler::SamplingLoop;
use speech::SpeechChannel;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use types::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let mut config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("hazard_watch={}", config.logging.level))
        .init();

    info!("👁 Hazard Watch starting");
    info!("✓ Configuration loaded from {}", config_path);

    if let Ok(url) = std::env::var("HAZARD_SERVER_URL") {
        config.detector.server_url = url;
    }
    info!("📡 Detector URL: {}", config.detector.server_url);

    let geometry = GeometryEstimator::new(config.geometry.clone());
    let detector = DetectorClient::new(&config.detector, geometry)?;
    info!("✓ Detector client ready");

    let renderer = speech::renderer_from_config(&config.speech);
    let speech_channel = SpeechChannel::start(renderer);
    info!("✓ Speech channel started ({})", config.speech.engine);

    let slot = FrameSlot::new();
    let source = DirectoryFrameSource::new(config.frames.clone())?;

    let metrics = PipelineMetrics::new();
    let debouncer = AlertDebouncer::new(&config.alerts, config.ranking.category_ordinals);
    let sampling_loop = SamplingLoop::new(
        config.sampling.clone(),
        config.ranking.clone(),
        detector,
        debouncer,
        slot.clone(),
        metrics.clone(),
    );

    let cancel = CancellationToken::new();
    let source_task = tokio::spawn(source.run(slot, cancel.clone()));

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Stop requested, shutting down");
                cancel.cancel();
            }
        });
    }

    sampling_loop.run(&speech_channel, cancel.clone()).await;
    cancel.cancel();

    if source_task.await.is_err() {
        warn!("Frame source task ended abnormally");
    }

    // Queued warnings are spoken before the worker exits
    speech_channel.shutdown().await;

    let summary = metrics.summary();
    info!(
        "Session summary: {}",
        serde_json::to_string(&summary).unwrap_or_default()
    );

    Ok(())
}
