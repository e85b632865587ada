//! Averaged frame-to-frame difference image
//!
//! Averages `|f[i] - f[i-1]|` over a range of consecutive frames starting
//! at a named file. Static sky cancels; moving or variable sources remain.
//! The result is written as 32-bit float FITS, optionally with a
//! percentile-stretched PNG preview.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin difference_image -- --source-directory data/run1 \
//!     --start-filename img_0100.fits --frame-count 25 \
//!     --output-fits diff.fits --output-preview diff.png
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use quicklook::pipeline::run_difference;
use quicklook::shared_args::{ConfigFileArgs, PercentileArgs, SequenceArgs};
use shared::DifferenceConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Difference Image",
    about = "Averages absolute differences of consecutive FITS frames",
    long_about = None
)]
struct Args {
    #[command(flatten)]
    config_file: ConfigFileArgs,

    /// Directory containing the FITS frames
    #[arg(long)]
    source_directory: Option<PathBuf>,

    /// File name of the first frame in the range
    #[arg(long)]
    start_filename: Option<String>,

    /// Number of frames in the range, including the first (default 25)
    #[arg(long)]
    frame_count: Option<usize>,

    /// Output FITS path (default difference_image.fits)
    #[arg(long)]
    output_fits: Option<PathBuf>,

    /// Also write an 8-bit PNG preview here
    #[arg(long)]
    output_preview: Option<PathBuf>,

    #[command(flatten)]
    percentiles: PercentileArgs,

    #[command(flatten)]
    sequence: SequenceArgs,
}

impl Args {
    fn resolve(&self) -> Result<DifferenceConfig> {
        let mut config = match &self.config_file.config {
            Some(path) => DifferenceConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => DifferenceConfig::default(),
        };

        if let Some(dir) = &self.source_directory {
            config.source_directory = dir.clone();
        }
        if let Some(name) = &self.start_filename {
            config.start_filename = name.clone();
        }
        if let Some(count) = self.frame_count {
            config.frame_count = count;
        }
        if let Some(path) = &self.output_fits {
            config.output_fits = path.clone();
        }
        if let Some(path) = &self.output_preview {
            config.output_preview = Some(path.clone());
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

    let outcome = run_difference(&config).with_context(|| {
        format!(
            "Difference image failed for {} starting at {}",
            config.source_directory.display(),
            config.start_filename
        )
    })?;

    println!(
        "Difference of {} frames from index {} saved to {}",
        outcome.frames_used,
        outcome.start_index,
        outcome.output_fits.display()
    );
    if let Some((path, range)) = &outcome.preview {
        println!(
            "Preview saved to {} (range {:.3} .. {:.3})",
            path.display(),
            range.vmin,
            range.vmax
        );
    }

    Ok(())
}
