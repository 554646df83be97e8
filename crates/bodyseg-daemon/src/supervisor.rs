//! Lifecycle orchestration: start the watcher and the processing loop,
//! drain and join them on shutdown.

use crate::config::Config;
use crate::pipeline::{PipelineStats, ProcessingLoop};
use crate::queue::WorkQueue;
use crate::watcher::ImageWatcher;
use anyhow::{Context, Result};
use bodyseg_core::{ensure_group_dirs, Segmenter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

/// Resolved runtime settings for one supervisor lifetime
#[derive(Debug, Clone)]
pub struct Settings {
    pub watch_dir: PathBuf,
    pub output_dir: PathBuf,
    pub queue_capacity: usize,
    pub debounce: Duration,
    pub poll_timeout: Duration,
    pub drain_timeout: Duration,
    pub min_pixels: u32,
}

impl Settings {
    /// Settings from a loaded config, with directories supplied by the caller
    #[must_use]
    pub fn from_config(config: &Config, watch_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            watch_dir,
            output_dir,
            queue_capacity: config.queue_capacity(),
            debounce: config.debounce(),
            poll_timeout: config.poll_timeout(),
            drain_timeout: config.drain_timeout(),
            min_pixels: config.min_pixels(),
        }
    }
}

/// Owns the watcher thread and the single processing thread
pub struct Supervisor {
    running: Arc<AtomicBool>,
    queue: WorkQueue,
    watcher: Option<ImageWatcher>,
    worker: Option<JoinHandle<PipelineStats>>,
    drain_timeout: Duration,
}

impl Supervisor {
    /// Start the pipeline: validates directories, spawns the processing
    /// loop, then subscribes the watcher.
    ///
    /// A missing watch directory or an unusable output directory is fatal.
    pub fn start(settings: &Settings, segmenter: Box<dyn Segmenter + Send>) -> Result<Self> {
        anyhow::ensure!(
            settings.watch_dir.is_dir(),
            "Watch directory not found: {}",
            settings.watch_dir.display()
        );

        // Group directories are created eagerly so persist never races
        // their creation mid-run
        ensure_group_dirs(&settings.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                settings.output_dir.display()
            )
        })?;

        info!("Output directory: {}", settings.output_dir.display());

        let running = Arc::new(AtomicBool::new(true));
        let queue = WorkQueue::new(settings.queue_capacity);

        let worker_loop = ProcessingLoop::new(
            queue.clone(),
            segmenter,
            settings.output_dir.clone(),
            settings.min_pixels,
            settings.poll_timeout,
            Arc::clone(&running),
        );
        let worker = thread::Builder::new()
            .name("bodyseg-processing".to_string())
            .spawn(move || worker_loop.run())
            .context("Failed to spawn processing thread")?;

        // Watcher starts last: every event it emits has a live consumer
        let watcher = ImageWatcher::start(&settings.watch_dir, queue.clone(), settings.debounce)?;

        info!("Pipeline started");

        Ok(Self {
            running,
            queue,
            watcher: Some(watcher),
            worker: Some(worker),
            drain_timeout: settings.drain_timeout,
        })
    }

    /// Stop the pipeline: unsubscribe the watcher, drain the queue within
    /// the drain timeout, then stop and join the processing thread.
    /// Idempotent; safe to call again after it returns.
    pub fn stop(&mut self) {
        if self.watcher.is_none() && self.worker.is_none() {
            return;
        }
        info!("Stopping pipeline...");

        // No new items after this point
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }

        // Drain with the worker still running so queued files finish;
        // bounded so a wedged inference call cannot hang shutdown forever
        let drained = self.queue.join(self.drain_timeout);
        if !drained {
            warn!(
                "Queue drain timed out after {:?}; shutting down with work outstanding",
                self.drain_timeout
            );
        }

        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if drained {
                match worker.join() {
                    Ok(stats) => info!(
                        "Final stats: processed={}, skipped={}, failed={}",
                        stats.processed, stats.skipped, stats.failed
                    ),
                    Err(_) => error!("Processing thread panicked"),
                }
            } else {
                // Forced termination over indefinite hang: leave the
                // worker detached, process exit reaps it
                warn!("Processing thread not joined; it may still be mid-inference");
            }
        }

        info!("Pipeline stopped");
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop();
    }
}
