//! Integration tests for the processing pipeline
//!
//! These use stub segmenters so the full queue → loop → persist path runs
//! without a model file, plus one end-to-end run through the real watcher.

use bodyseg_core::{LabelMask, SegmentError, Segmenter};
use bodyseg_daemon::{PipelineStats, ProcessingLoop, Settings, Supervisor, WorkQueue};
use image::RgbImage;
use ndarray::array;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A 4x4 mask where label 1 covers 3 px and labels 2 and 3 cover 4 px each
fn sample_mask() -> LabelMask {
    array![
        [0, 0, 1, 1],
        [0, 1, 1, 2],
        [3, 3, 2, 2],
        [3, 3, 0, 0]
    ]
}

struct StubSegmenter;

impl Segmenter for StubSegmenter {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn segment(&mut self, _image: &RgbImage) -> Result<LabelMask, SegmentError> {
        Ok(sample_mask())
    }
}

struct FailingSegmenter;

impl Segmenter for FailingSegmenter {
    fn name(&self) -> &'static str {
        "failing-stub"
    }

    fn segment(&mut self, _image: &RgbImage) -> Result<LabelMask, SegmentError> {
        Err(SegmentError::Inference("stub inference failure".to_string()))
    }
}

fn write_test_image(path: &Path) {
    RgbImage::new(4, 4).save(path).unwrap();
}

fn spawn_loop(
    queue: WorkQueue,
    segmenter: Box<dyn Segmenter + Send>,
    output_dir: PathBuf,
    running: Arc<AtomicBool>,
) -> JoinHandle<PipelineStats> {
    let worker = ProcessingLoop::new(
        queue,
        segmenter,
        output_dir,
        0,
        Duration::from_millis(50),
        running,
    );
    thread::spawn(move || worker.run())
}

#[test]
fn test_end_to_end_four_by_four_mask() {
    let watch = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();

    let photo = watch.path().join("photo.jpg");
    write_test_image(&photo);

    let queue = WorkQueue::new(10);
    let running = Arc::new(AtomicBool::new(true));
    let handle = spawn_loop(
        queue.clone(),
        Box::new(StubSegmenter),
        output.path().to_path_buf(),
        Arc::clone(&running),
    );

    queue.push(photo);
    assert!(queue.join(Duration::from_secs(5)));
    running.store(false, Ordering::SeqCst);
    let stats = handle.join().unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.failed, 0);

    // Labels 1, 2, 3 -> head, torso, left_arm; plus the full mask
    assert!(output.path().join("head/head_photo.png").is_file());
    assert!(output.path().join("torso/torso_photo.png").is_file());
    assert!(output.path().join("left_arm/left_arm_photo.png").is_file());
    assert!(output.path().join("photo_full_segmentation.png").is_file());

    // No other groups got files
    assert!(std::fs::read_dir(output.path().join("right_arm"))
        .unwrap()
        .next()
        .is_none());
}

#[test]
fn test_failed_segmentation_writes_nothing_and_retries() {
    let watch = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();

    let photo = watch.path().join("bad.png");
    write_test_image(&photo);

    let queue = WorkQueue::new(10);
    let running = Arc::new(AtomicBool::new(true));
    let handle = spawn_loop(
        queue.clone(),
        Box::new(FailingSegmenter),
        output.path().to_path_buf(),
        Arc::clone(&running),
    );

    queue.push(photo.clone());
    assert!(queue.join(Duration::from_secs(5)));

    // The failure must not mark the file done: a second event gets a
    // fresh attempt rather than a skip
    queue.push(photo);
    assert!(queue.join(Duration::from_secs(5)));

    running.store(false, Ordering::SeqCst);
    let stats = handle.join().unwrap();

    assert_eq!(stats.failed, 2);
    assert_eq!(stats.processed, 0);
    assert_eq!(stats.skipped, 0);

    // Nothing was persisted, not even the group directories
    assert!(!output.path().join("head").exists());
    assert!(!output.path().join("bad_full_segmentation.png").exists());
}

#[test]
fn test_duplicate_enqueue_is_skipped_and_acknowledged() {
    let watch = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();

    let photo = watch.path().join("photo.png");
    write_test_image(&photo);

    let queue = WorkQueue::new(10);
    let running = Arc::new(AtomicBool::new(true));
    let handle = spawn_loop(
        queue.clone(),
        Box::new(StubSegmenter),
        output.path().to_path_buf(),
        Arc::clone(&running),
    );

    queue.push(photo.clone());
    queue.push(photo);

    // Join terminating proves the skip cycle acknowledged its item too
    assert!(queue.join(Duration::from_secs(5)));
    running.store(false, Ordering::SeqCst);
    let stats = handle.join().unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn test_undecodable_file_is_contained_failure() {
    let watch = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();

    let bogus = watch.path().join("bogus.png");
    std::fs::write(&bogus, b"not actually a png").unwrap();
    let good = watch.path().join("good.png");
    write_test_image(&good);

    let queue = WorkQueue::new(10);
    let running = Arc::new(AtomicBool::new(true));
    let handle = spawn_loop(
        queue.clone(),
        Box::new(StubSegmenter),
        output.path().to_path_buf(),
        Arc::clone(&running),
    );

    // A decode failure must not take the loop down
    queue.push(bogus);
    queue.push(good);
    assert!(queue.join(Duration::from_secs(5)));
    running.store(false, Ordering::SeqCst);
    let stats = handle.join().unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.processed, 1);
    assert!(output.path().join("head/head_good.png").is_file());
}

#[test]
fn test_supervisor_end_to_end_via_watcher() {
    let watch = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();

    let settings = Settings {
        watch_dir: watch.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        queue_capacity: 10,
        debounce: Duration::from_millis(50),
        poll_timeout: Duration::from_millis(50),
        drain_timeout: Duration::from_secs(5),
        min_pixels: 0,
    };

    let mut supervisor = Supervisor::start(&settings, Box::new(StubSegmenter)).unwrap();

    // Drop a new image into the watched directory and wait for the
    // pipeline to pick it up
    write_test_image(&watch.path().join("photo.png"));

    let full_mask = output.path().join("photo_full_segmentation.png");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !full_mask.exists() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }

    supervisor.stop();

    assert!(full_mask.is_file());
    assert!(output.path().join("head/head_photo.png").is_file());
    assert!(output.path().join("torso/torso_photo.png").is_file());
    assert!(output.path().join("left_arm/left_arm_photo.png").is_file());
}

#[test]
fn test_supervisor_start_fails_without_watch_dir() {
    let output = tempfile::TempDir::new().unwrap();

    let settings = Settings {
        watch_dir: PathBuf::from("/nonexistent/captures"),
        output_dir: output.path().to_path_buf(),
        queue_capacity: 10,
        debounce: Duration::from_millis(50),
        poll_timeout: Duration::from_millis(50),
        drain_timeout: Duration::from_secs(1),
        min_pixels: 0,
    };

    assert!(Supervisor::start(&settings, Box::new(StubSegmenter)).is_err());
}

#[test]
fn test_supervisor_stop_is_idempotent() {
    let watch = tempfile::TempDir::new().unwrap();
    let output = tempfile::TempDir::new().unwrap();

    let settings = Settings {
        watch_dir: watch.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        queue_capacity: 10,
        debounce: Duration::from_millis(50),
        poll_timeout: Duration::from_millis(50),
        drain_timeout: Duration::from_secs(1),
        min_pixels: 0,
    };

    let mut supervisor = Supervisor::start(&settings, Box::new(StubSegmenter)).unwrap();
    supervisor.stop();
    supervisor.stop();

    // Group directories were created eagerly at startup
    for group in ["head", "left_arm", "right_arm", "torso", "left_leg", "right_leg", "other"] {
        assert!(output.path().join(group).is_dir());
    }
}
