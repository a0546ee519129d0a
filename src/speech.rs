// src/speech.rs
//
// Decouples "decided to speak" from "actually speaking". One worker
// task consumes the queue in order and renders one utterance at a time;
// the producer never blocks on audio.

use crate::types::SpeechConfig;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[async_trait]
pub trait SpeechRenderer: Send + Sync {
    async fn render(&self, text: &str) -> Result<()>;
}

/// Logs utterances instead of producing audio. Default engine, and the
/// fallback for machines without a TTS binary.
pub struct LogRenderer;

#[async_trait]
impl SpeechRenderer for LogRenderer {
    async fn render(&self, text: &str) -> Result<()> {
        info!("[VOICE] {}", text);
        Ok(())
    }
}

/// Renders through the espeak-ng command line tool
pub struct EspeakRenderer {
    voice: String,
    rate: u32,
}

impl EspeakRenderer {
    pub fn new(voice: &str, rate: u32) -> Self {
        Self {
            voice: voice.to_string(),
            rate,
        }
    }
}

#[async_trait]
impl SpeechRenderer for EspeakRenderer {
    async fn render(&self, text: &str) -> Result<()> {
        let status = tokio::process::Command::new("espeak-ng")
            .arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg(self.rate.to_string())
            .arg(text)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .context("Failed to launch espeak-ng")?;

        if !status.success() {
            bail!("espeak-ng exited with {}", status);
        }
        Ok(())
    }
}

pub fn renderer_from_config(config: &SpeechConfig) -> Arc<dyn SpeechRenderer> {
    match config.engine.as_str() {
        "espeak" => Arc::new(EspeakRenderer::new(&config.voice, config.rate)),
        "log" => Arc::new(LogRenderer),
        other => {
            warn!("Unknown speech engine '{}', falling back to log", other);
            Arc::new(LogRenderer)
        }
    }
}

enum SpeechCommand {
    Speak(String),
    Stop,
}

/// Single-consumer utterance queue with an explicit start/shutdown
/// lifecycle. FIFO, unbounded, nothing dropped; keeping volume low is
/// the debouncer's job.
pub struct SpeechChannel {
    tx: mpsc::UnboundedSender<SpeechCommand>,
    worker: JoinHandle<()>,
}

impl SpeechChannel {
    pub fn start(renderer: Arc<dyn SpeechRenderer>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    SpeechCommand::Speak(text) => {
                        // Render failures must not take the channel down
                        if let Err(e) = renderer.render(&text).await {
                            warn!("Speech rendering failed: {:#}", e);
                        }
                    }
                    SpeechCommand::Stop => break,
                }
            }
            debug!("Speech worker stopped");
        });

        Self { tx, worker }
    }

    /// Non-blocking append to the tail of the queue
    pub fn enqueue(&self, text: String) {
        if self.tx.send(SpeechCommand::Speak(text)).is_err() {
            warn!("Speech worker is gone, dropping utterance");
        }
    }

    /// Graceful shutdown: everything already queued is spoken first.
    /// The sentinel sits behind queued utterances, so the worker drains
    /// in order and then exits.
    pub async fn shutdown(self) {
        let _ = self.tx.send(SpeechCommand::Stop);
        if self.worker.await.is_err() {
            warn!("Speech worker ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records utterances and flags any overlapping render calls
    struct RecordingRenderer {
        spoken: Mutex<Vec<String>>,
        in_flight: AtomicBool,
        overlapped: AtomicBool,
    }

    impl RecordingRenderer {
        fn new() -> Self {
            Self {
                spoken: Mutex::new(Vec::new()),
                in_flight: AtomicBool::new(false),
                overlapped: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl SpeechRenderer for RecordingRenderer {
        async fn render(&self, text: &str) -> Result<()> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.spoken.lock().unwrap().push(text.to_string());
            self.in_flight.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl SpeechRenderer for FailingRenderer {
        async fn render(&self, _text: &str) -> Result<()> {
            bail!("no audio device")
        }
    }

    #[tokio::test]
    async fn test_utterances_render_in_order_without_overlap() {
        let renderer = Arc::new(RecordingRenderer::new());
        let channel = SpeechChannel::start(renderer.clone());

        channel.enqueue("A".to_string());
        channel.enqueue("B".to_string());
        channel.enqueue("C".to_string());
        channel.shutdown().await;

        let spoken = renderer.spoken.lock().unwrap().clone();
        assert_eq!(spoken, vec!["A", "B", "C"]);
        assert!(!renderer.overlapped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_utterances() {
        let renderer = Arc::new(RecordingRenderer::new());
        let channel = SpeechChannel::start(renderer.clone());

        for i in 0..10 {
            channel.enqueue(format!("utterance {}", i));
        }
        // Shutdown races the worker; queued items must still be spoken
        channel.shutdown().await;

        assert_eq!(renderer.spoken.lock().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_render_failures_do_not_stop_the_worker() {
        let recording = Arc::new(RecordingRenderer::new());

        struct FlakyRenderer {
            inner: Arc<RecordingRenderer>,
        }

        #[async_trait]
        impl SpeechRenderer for FlakyRenderer {
            async fn render(&self, text: &str) -> Result<()> {
                if text == "bad" {
                    bail!("render error");
                }
                self.inner.render(text).await
            }
        }

        let channel = SpeechChannel::start(Arc::new(FlakyRenderer {
            inner: recording.clone(),
        }));
        channel.enqueue("bad".to_string());
        channel.enqueue("good".to_string());
        channel.shutdown().await;

        assert_eq!(recording.spoken.lock().unwrap().clone(), vec!["good"]);
    }

    #[tokio::test]
    async fn test_failing_renderer_channel_survives() {
        let channel = SpeechChannel::start(Arc::new(FailingRenderer));
        channel.enqueue("anything".to_string());
        // Shutdown completing proves the worker did not die mid-queue
        channel.shutdown().await;
    }
}
