//! Configuration loading for bodyseg-daemon.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default queue capacity before enqueue blocks
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default settle delay after a create event (ms)
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default consumer poll timeout (ms)
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 1000;

/// Default shutdown drain timeout (secs)
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 5;

/// Default minimum pixel count for a part to be kept
pub const DEFAULT_MIN_PIXELS: u32 = 100;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    pub watch: Option<WatchConfig>,
    pub output: Option<OutputConfig>,
    pub processing: Option<ProcessingConfig>,
    pub model: Option<ModelConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WatchConfig {
    pub dir: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub queue_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ProcessingConfig {
    pub poll_timeout_ms: Option<u64>,
    pub drain_timeout_secs: Option<u64>,
    pub min_pixels: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ModelConfig {
    pub backend: Option<String>,
    pub path: Option<PathBuf>,
    pub size: Option<String>,
}

impl Config {
    pub fn watch_dir(&self) -> Option<PathBuf> {
        self.watch.as_ref().and_then(|w| w.dir.clone())
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.output.as_ref().and_then(|o| o.dir.clone())
    }

    pub fn debounce(&self) -> Duration {
        let ms = self
            .watch
            .as_ref()
            .and_then(|w| w.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);
        Duration::from_millis(ms)
    }

    pub fn queue_capacity(&self) -> usize {
        self.watch
            .as_ref()
            .and_then(|w| w.queue_capacity)
            .unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn poll_timeout(&self) -> Duration {
        let ms = self
            .processing
            .as_ref()
            .and_then(|p| p.poll_timeout_ms)
            .unwrap_or(DEFAULT_POLL_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        let secs = self
            .processing
            .as_ref()
            .and_then(|p| p.drain_timeout_secs)
            .unwrap_or(DEFAULT_DRAIN_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn min_pixels(&self) -> u32 {
        self.processing
            .as_ref()
            .and_then(|p| p.min_pixels)
            .unwrap_or(DEFAULT_MIN_PIXELS)
    }

    pub fn model_backend(&self) -> Option<String> {
        self.model.as_ref().and_then(|m| m.backend.clone())
    }

    pub fn model_path(&self) -> Option<PathBuf> {
        self.model.as_ref().and_then(|m| m.path.clone())
    }

    pub fn model_size(&self) -> Option<String> {
        self.model.as_ref().and_then(|m| m.size.clone())
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "bodyseg").context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config =
        toml::from_str(&contents).context("Failed to parse config file as TOML")?;
    Ok(config)
}
