// src/frame_source.rs
//
// The "latest frame" handoff between whatever produces frames and the
// sampling loop, plus a directory-backed producer that stands in for a
// camera.

use crate::types::FrameSourceConfig;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One JPEG frame plus its nominal geometry. The pipeline never decodes
/// the bytes; width/height are only consulted for bbox-only detections.
#[derive(Debug, Clone)]
pub struct Frame {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: f64,
}

/// Single-slot frame handoff: every publish overwrites, every read sees
/// the most recent publish. Skipped or duplicated reads are tolerated
/// downstream, so no further coordination is needed.
#[derive(Clone)]
pub struct FrameSlot {
    inner: Arc<Mutex<Option<Frame>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    pub fn publish(&self, frame: Frame) {
        *self.lock() = Some(frame);
    }

    pub fn latest(&self) -> Option<Frame> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Frame>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Cycles through the JPEG files of a directory at a fixed rate,
/// publishing each into the slot. Stands in for the camera collaborator
/// so the pipeline can run end to end.
pub struct DirectoryFrameSource {
    config: FrameSourceConfig,
    files: Vec<PathBuf>,
}

impl DirectoryFrameSource {
    pub fn new(config: FrameSourceConfig) -> Result<Self> {
        let extensions = ["jpg", "jpeg", "JPG", "JPEG"];
        let mut files = Vec::new();

        for entry in WalkDir::new(&config.input_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if let Some(ext) = path.extension() {
                if extensions.contains(&ext.to_str().unwrap_or("")) {
                    files.push(path.to_path_buf());
                }
            }
        }
        files.sort();

        if files.is_empty() {
            bail!("No JPEG frames found in {}", config.input_dir);
        }

        info!("Found {} frame files in {}", files.len(), config.input_dir);
        Ok(Self { config, files })
    }

    /// Publish frames until cancelled. Unreadable files are skipped.
    pub async fn run(self, slot: FrameSlot, cancel: CancellationToken) {
        let period = Duration::from_secs_f64(1.0 / self.config.fps);
        let started = Instant::now();
        let mut index = 0usize;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(period) => {}
            }

            let path = &self.files[index % self.files.len()];
            index += 1;

            match std::fs::read(path) {
                Ok(jpeg) => {
                    slot.publish(Frame {
                        jpeg,
                        width: self.config.width,
                        height: self.config.height,
                        timestamp_ms: started.elapsed().as_secs_f64() * 1000.0,
                    });
                }
                Err(e) => warn!("Failed to read frame {}: {}", path.display(), e),
            }
        }

        debug!("Frame source stopped after {} frames", index);
    }
}
