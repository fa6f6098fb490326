//! Debounced background re-grading for interactive previews.
//!
//! Slider moves arrive far faster than a full-resolution grade finishes. The
//! worker waits for a quiet period, grades only the newest request on the
//! blocking pool and drops any result that a later request has already
//! superseded.

use super::apply::apply_luts;
use super::image::PixelBuffer;
use super::Lut3d;
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

/// Quiet period used by [`PreviewWorker::spawn_default`].
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// A snapshot of the LUT stack to grade with.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub luts: Vec<Lut3d>,
    pub global_intensity: f32,
}

pub type Preview = Option<Arc<PixelBuffer>>;

pub struct PreviewWorker {
    requests: mpsc::UnboundedSender<PreviewRequest>,
    results: watch::Receiver<Preview>,
    handle: JoinHandle<()>,
}

impl PreviewWorker {
    /// Start grading `original` in the background. Must be called from
    /// within a tokio runtime.
    pub fn spawn(original: PixelBuffer, debounce: Duration) -> Self {
        let (requests, rx) = mpsc::unbounded_channel();
        let (tx, results) = watch::channel(None);
        let handle = tokio::spawn(run(Arc::new(original), debounce, rx, tx));
        Self {
            requests,
            results,
            handle,
        }
    }

    pub fn spawn_default(original: PixelBuffer) -> Self {
        Self::spawn(original, DEFAULT_DEBOUNCE)
    }

    /// Queue a re-grade. Earlier requests still waiting are superseded.
    pub fn request(&self, luts: Vec<Lut3d>, global_intensity: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&global_intensity) {
            return Err(Error::Validation(format!(
                "global intensity must be within [0, 1], got {global_intensity}"
            )));
        }
        self.requests
            .send(PreviewRequest {
                luts,
                global_intensity,
            })
            .map_err(|_| Error::WorkerStopped)
    }

    /// Receiver that wakes whenever a new preview is published.
    pub fn subscribe(&self) -> watch::Receiver<Preview> {
        self.results.clone()
    }

    pub fn latest(&self) -> Preview {
        self.results.borrow().clone()
    }

    /// Stop accepting requests and wait for the in-flight grade to finish.
    pub async fn shutdown(self) {
        drop(self.requests);
        if let Err(e) = self.handle.await {
            warn!("preview worker ended abnormally: {e}");
        }
    }
}

async fn run(
    original: Arc<PixelBuffer>,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<PreviewRequest>,
    tx: watch::Sender<Preview>,
) {
    let mut generation = 0u64;
    while let Some(mut request) = rx.recv().await {
        // Keep taking newer requests until the channel stays quiet.
        while let Ok(Some(next)) = timeout(debounce, rx.recv()).await {
            request = next;
        }
        generation += 1;
        trace!(
            "preview #{generation}: {} LUTs at {}",
            request.luts.len(),
            request.global_intensity
        );

        let source = Arc::clone(&original);
        let job = tokio::task::spawn_blocking(move || {
            apply_luts(&source, &request.luts, request.global_intensity)
        });
        match job.await {
            Ok(_) if !rx.is_empty() => debug!("preview #{generation} superseded, discarding"),
            Ok(graded) => {
                tx.send_replace(Some(Arc::new(graded)));
            }
            Err(e) => warn!("preview #{generation} failed: {e}"),
        }
    }
    debug!("preview worker stopped after {generation} grades");
}
