//! bodyseg-daemon: watch a directory and segment arriving images into
//! color-coded body-part masks, organized by anatomical group.
//!
//! Runs in the foreground until SIGINT/SIGTERM, then drains the queue and
//! shuts down.

use anyhow::{Context, Result};
use bodyseg_core::{
    BodypixConfig, BodypixSegmenter, SapiensConfig, SapiensModel, SapiensSegmenter, Segmenter,
};
use bodyseg_daemon::config::{default_config_path, load_config, Config};
use bodyseg_daemon::supervisor::{Settings, Supervisor};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bodyseg-daemon")]
#[command(about = "Watches a directory and segments new images into body-part masks")]
#[command(version)]
struct Args {
    /// Directory to watch for new images
    #[arg(long)]
    watch_dir: Option<PathBuf>,

    /// Output directory for segmentation results
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Segmentation model backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Path to the ONNX model file
    #[arg(long)]
    model: Option<PathBuf>,

    /// Sapiens model size (0.3b, 0.6b, 1b, 2b)
    #[arg(long)]
    model_size: Option<String>,

    /// Minimum pixel count for a part to be kept
    #[arg(long)]
    min_pixels: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Sapiens,
    Bodypix,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = match args.config.clone() {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to load config from {}: {}. Using defaults.",
                config_path.display(),
                err
            );
            Config::default()
        }
    };

    let watch_dir = args
        .watch_dir
        .clone()
        .or_else(|| config.watch_dir())
        .unwrap_or_else(|| PathBuf::from("output/captures"));
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.output_dir())
        .unwrap_or_else(|| PathBuf::from("output/segmentation"));

    let mut settings = Settings::from_config(&config, watch_dir, output_dir);
    if let Some(min_pixels) = args.min_pixels {
        settings.min_pixels = min_pixels;
    }

    let segmenter = build_segmenter(&args, &config)?;

    tracing::info!("Watch directory: {}", settings.watch_dir.display());

    let mut supervisor = Supervisor::start(&settings, segmenter)?;

    wait_for_shutdown_signal()?;

    supervisor.stop();
    Ok(())
}

/// Resolve backend selection and load the model (fatal on failure)
fn build_segmenter(args: &Args, config: &Config) -> Result<Box<dyn Segmenter + Send>> {
    let backend = match args.backend {
        Some(backend) => backend,
        None => match config.model_backend().as_deref() {
            Some("sapiens") | None => Backend::Sapiens,
            Some("bodypix") => Backend::Bodypix,
            Some(other) => anyhow::bail!("Unknown model backend: {other}"),
        },
    };

    match backend {
        Backend::Sapiens => {
            let size_label = args
                .model_size
                .clone()
                .or_else(|| config.model_size())
                .unwrap_or_else(|| "1b".to_string());
            let model = SapiensModel::from_size_label(&size_label)
                .with_context(|| format!("Unknown Sapiens model size: {size_label}"))?;
            let model_path = args
                .model
                .clone()
                .or_else(|| config.model_path())
                .unwrap_or_else(|| PathBuf::from("models").join(model.filename()));

            let segmenter = SapiensSegmenter::new(&model_path, SapiensConfig::default())
                .with_context(|| format!("Failed to load model: {}", model_path.display()))?;
            Ok(Box::new(segmenter))
        }
        Backend::Bodypix => {
            let model_path = args
                .model
                .clone()
                .or_else(|| config.model_path())
                .unwrap_or_else(|| PathBuf::from("models/bodypix_mobilenet.onnx"));

            let segmenter = BodypixSegmenter::new(&model_path, BodypixConfig::default())
                .with_context(|| format!("Failed to load model: {}", model_path.display()))?;
            Ok(Box::new(segmenter))
        }
    }
}

/// Block until SIGINT or SIGTERM
fn wait_for_shutdown_signal() -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create signal runtime")?;

    rt.block_on(async {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, shutting down");
            }
        }
        Ok(())
    })
}
