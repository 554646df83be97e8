//! Directory watcher that feeds newly-created images into the work queue.
//!
//! Subscribes to create events on a single directory (non-recursive),
//! filters by extension, then waits a settle delay and re-checks the file
//! before enqueueing, so a file still being written is usually skipped
//! until its writer finishes. The settle check is best-effort, not atomic.
//! Enqueueing may block on a full queue; that backpressure intentionally
//! delays acknowledgment of later filesystem events.

use crate::queue::WorkQueue;
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Image extensions accepted by the watcher (lowercase)
const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tiff", "webp"];

/// Watches one directory for new images and enqueues them
pub struct ImageWatcher {
    /// Dropped on stop to disconnect the event channel
    watcher: Option<RecommendedWatcher>,
    handle: Option<JoinHandle<()>>,
}

impl ImageWatcher {
    /// Start watching `dir`, enqueueing qualifying files onto `queue`.
    ///
    /// The directory must already exist; a missing watch root is a fatal
    /// startup error, not a retryable condition.
    pub fn start(dir: &Path, queue: WorkQueue, settle: Duration) -> Result<Self> {
        anyhow::ensure!(
            dir.is_dir(),
            "Watch directory not found: {}",
            dir.display()
        );

        let (tx, rx) = mpsc::channel();
        let mut watcher =
            notify::recommended_watcher(tx).context("Failed to create file watcher")?;
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;

        info!("Watching directory: {}", dir.display());

        let handle = thread::Builder::new()
            .name("bodyseg-watcher".to_string())
            .spawn(move || event_loop(&rx, &queue, settle))
            .context("Failed to spawn watcher thread")?;

        Ok(Self {
            watcher: Some(watcher),
            handle: Some(handle),
        })
    }

    /// Stop the subscription and join the event thread. Idempotent.
    pub fn stop(&mut self) {
        // Dropping the notify watcher disconnects the channel, which ends
        // the event loop.
        self.watcher.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Watcher thread panicked");
            }
        }
    }
}

impl Drop for ImageWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drain filesystem events until the channel disconnects
fn event_loop(rx: &mpsc::Receiver<notify::Result<Event>>, queue: &WorkQueue, settle: Duration) {
    for result in rx {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                warn!("Watch error: {}", e);
                continue;
            }
        };

        if !matches!(event.kind, EventKind::Create(_)) {
            continue;
        }

        for path in event.paths {
            if !is_supported_image(&path) {
                debug!("Ignoring non-image create event: {}", path.display());
                continue;
            }
            // Let the writer finish before we look at the file
            thread::sleep(settle);
            if !file_is_ready(&path) {
                debug!("File vanished or empty after settle: {}", path.display());
                continue;
            }
            info!("New image detected: {}", path.display());
            queue.push(path);
        }
    }
}

/// Extension allow-list check, case-insensitive; directories never qualify
fn is_supported_image(path: &Path) -> bool {
    if path.is_dir() {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Post-settle check: the file still exists and has non-zero size
fn file_is_ready(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}
