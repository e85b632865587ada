//! Median background subtraction over a FITS sequence
//!
//! For each frame the static sky is estimated as the Gaussian-smoothed
//! per-pixel median of the surrounding frames and subtracted. The residual
//! is sharpened with an unsharp mask and written as a percentile-stretched
//! PNG named after the source file.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin background_subtract -- --source-directory data/run1 \
//!     --output-directory previews/run1
//!
//! # Start from a saved configuration and override the window
//! cargo run --release --bin background_subtract -- --config bg.json --window-radius 5
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use quicklook::pipeline::{run_background_subtraction_with, FrameEvent};
use quicklook::shared_args::{parse_sigma, ConfigFileArgs, PercentileArgs, SequenceArgs};
use shared::BackgroundConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Background Subtract",
    about = "Subtracts a running median background from each frame and writes sharpened previews",
    long_about = None
)]
struct Args {
    #[command(flatten)]
    config_file: ConfigFileArgs,

    /// Directory containing the FITS frames
    #[arg(long)]
    source_directory: Option<PathBuf>,

    /// Directory receiving one PNG per processed frame
    #[arg(long)]
    output_directory: Option<PathBuf>,

    /// Neighbouring frames used on each side of the target (default 10)
    #[arg(long)]
    window_radius: Option<usize>,

    /// Gaussian sigma smoothing the median background (default 5)
    #[arg(long, value_parser = parse_sigma)]
    blur_sigma: Option<f64>,

    /// Gaussian sigma of the unsharp mask (default 10)
    #[arg(long, value_parser = parse_sigma)]
    sharpen_sigma: Option<f64>,

    /// Unsharp mask gain (default 10)
    #[arg(long)]
    sharpen_strength: Option<f64>,

    #[command(flatten)]
    percentiles: PercentileArgs,

    #[command(flatten)]
    sequence: SequenceArgs,

    /// Also process edge frames with a one-sided window (true/false)
    #[arg(long, value_name = "BOOL")]
    partial_windows: Option<bool>,

    /// Keep decoded window frames in memory between targets
    #[arg(long)]
    cache_frames: bool,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

impl Args {
    fn resolve(&self) -> Result<BackgroundConfig> {
        let mut config = match &self.config_file.config {
            Some(path) => BackgroundConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => BackgroundConfig::default(),
        };

        if let Some(dir) = &self.source_directory {
            config.source_directory = dir.clone();
        }
        if let Some(dir) = &self.output_directory {
            config.output_directory = dir.clone();
        }
        if let Some(radius) = self.window_radius {
            config.window_radius = radius;
        }
        if let Some(sigma) = self.blur_sigma {
            config.blur_sigma = sigma;
        }
        if let Some(sigma) = self.sharpen_sigma {
            config.sharpen_sigma = sigma;
        }
        if let Some(strength) = self.sharpen_strength {
            config.sharpen_strength = strength;
        }
        if let Some(partial) = self.partial_windows {
            config.full_window_only = !partial;
        }
        if self.cache_frames {
            config.cache_frames = true;
        }
        self.percentiles
            .apply_to(&mut config.percentile_low, &mut config.percentile_high);
        self.sequence
            .apply_to(&mut config.recursive, &mut config.ordering);

        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.resolve()?;

    if let Some(path) = &args.config_file.save_config {
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to save config {}", path.display()))?;
        info!("Configuration saved to {}", path.display());
    }

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} frames ({eta}) {msg}")
            .context("Invalid progress template")?,
    );

    let report = run_background_subtraction_with(&config, |event| match event {
        FrameEvent::Started { targets } => progress.set_length(*targets as u64),
        FrameEvent::Processed(frame) => {
            progress.set_message(frame.output.display().to_string());
            progress.inc(1);
        }
        FrameEvent::Skipped(frame) => {
            progress.set_message(format!("skipped {}", frame.source.display()));
            progress.inc(1);
        }
    })
    .with_context(|| {
        format!(
            "Background subtraction failed for {}",
            config.source_directory.display()
        )
    })?;
    progress.finish_and_clear();

    println!(
        "Processed {} of {} frames into {} ({} skipped)",
        report.processed.len(),
        report.total_frames,
        config.output_directory.display(),
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.source.display(), skipped.reason);
    }

    Ok(())
}
