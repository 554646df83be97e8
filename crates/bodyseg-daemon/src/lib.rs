//! bodyseg-daemon: directory-watching segmentation pipeline
//!
//! This crate provides:
//! - A notify-based directory watcher with extension filtering and a
//!   settle delay for partially-written files
//! - A bounded, acknowledged work queue with blocking backpressure
//! - The single-consumer processing loop and its idempotency gate
//! - The supervisor that ties lifecycle and graceful drain together

pub mod config;
pub mod dedup;
pub mod pipeline;
pub mod queue;
pub mod supervisor;
pub mod watcher;

// Re-exports for convenience
pub use config::{default_config_path, load_config, Config};
pub use dedup::ProcessedSet;
pub use pipeline::{PipelineStats, ProcessingLoop};
pub use queue::WorkQueue;
pub use supervisor::{Settings, Supervisor};
pub use watcher::ImageWatcher;
