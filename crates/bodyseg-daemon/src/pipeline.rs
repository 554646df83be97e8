//! The single-consumer processing loop.
//!
//! Dequeues paths, runs segmentation, organizes and persists the masks,
//! and marks completed files in the processed set. Every cycle issues
//! exactly one queue acknowledgment whether it succeeds, skips, or fails,
//! so a shutdown drain always terminates. Per-file errors are contained to
//! their cycle; only the supervisor's running flag ends the loop.
//!
//! There is no per-image timeout: a hanging inference call blocks the
//! pipeline (known limitation of the serialized, one-model design).

use crate::dedup::ProcessedSet;
use crate::queue::WorkQueue;
use anyhow::{Context, Result};
use bodyseg_core::{extract_parts, load_image, persist, SegmentationResult, Segmenter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Counters reported when the loop stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub processed: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Single consumer that drains the work queue through the segmenter
pub struct ProcessingLoop {
    queue: WorkQueue,
    processed: ProcessedSet,
    segmenter: Box<dyn Segmenter + Send>,
    output_dir: PathBuf,
    min_pixels: u32,
    poll_timeout: Duration,
    running: Arc<AtomicBool>,
}

impl ProcessingLoop {
    pub fn new(
        queue: WorkQueue,
        segmenter: Box<dyn Segmenter + Send>,
        output_dir: PathBuf,
        min_pixels: u32,
        poll_timeout: Duration,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            queue,
            processed: ProcessedSet::new(),
            segmenter,
            output_dir,
            min_pixels,
            poll_timeout,
            running,
        }
    }

    /// Run until the running flag clears. Consumes the loop; returns the
    /// final counters.
    pub fn run(mut self) -> PipelineStats {
        info!("Processing worker started (backend: {})", self.segmenter.name());
        let mut stats = PipelineStats::default();

        while self.running.load(Ordering::SeqCst) {
            let Some(path) = self.queue.pop(self.poll_timeout) else {
                continue;
            };

            if self.processed.is_done(&path) {
                info!("Already processed, skipping: {}", path.display());
                stats.skipped += 1;
                self.queue.task_done();
                continue;
            }

            match self.process_file(&path) {
                Ok(result) => {
                    info!(
                        "Processed in {:.1}s: {} ({} parts)",
                        result.elapsed.as_secs_f64(),
                        path.display(),
                        result.parts.len()
                    );
                    self.processed.mark_done(path);
                    stats.processed += 1;
                }
                Err(e) => {
                    // Not marked done: a later create event retries it
                    error!("Processing failed: {}: {:#}", path.display(), e);
                    stats.failed += 1;
                }
            }
            self.queue.task_done();
        }

        info!(
            "Processing worker stopped (processed={}, skipped={}, failed={})",
            stats.processed, stats.skipped, stats.failed
        );
        stats
    }

    /// One full segment-organize-persist cycle for a single file
    fn process_file(&mut self, path: &Path) -> Result<SegmentationResult> {
        let start = Instant::now();

        let image = load_image(path)?;
        info!(
            "Processing: {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );

        let mask = self.segmenter.segment(&image)?;
        let parts = extract_parts(&mask, self.min_pixels);

        let base_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        persist(&self.output_dir, &base_name, &parts, &mask)
            .with_context(|| format!("Failed to save segmentation for {}", path.display()))?;

        Ok(SegmentationResult {
            source_path: path.to_path_buf(),
            mask,
            parts,
            elapsed: start.elapsed(),
        })
    }
}
