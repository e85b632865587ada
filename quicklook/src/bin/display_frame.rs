//! Render a single FITS frame as a stretched 8-bit PNG
//!
//! Display limits default to `mean - 0.5 sigma .. mean + 2 sigma`; pass
//! `--percentiles` to use percentile limits instead. A stretch function
//! (linear, sqrt, log or asinh) is applied after clipping.
//!
//! ```bash
//! cargo run --bin display_frame -- frame_0001.fits --output frame.png --stretch asinh
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use quicklook::image_proc::save_gray_png;
use quicklook::shared_args::{parse_percentile, StretchArg};
use shared::fits_io::load_frame;
use shared::viz::{percentile_range, render, sigma_range};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Display Frame",
    about = "Writes a contrast-stretched PNG preview of one FITS frame",
    long_about = None
)]
struct Args {
    /// FITS file to render
    path: PathBuf,

    /// Output PNG (defaults to the input path with a .png extension)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Stretch applied after clipping to the display range
    #[arg(long, value_enum, default_value_t = StretchArg::Linear)]
    stretch: StretchArg,

    /// Lower limit in standard deviations below the mean
    #[arg(long, default_value_t = 0.5)]
    low_sigma: f64,

    /// Upper limit in standard deviations above the mean
    #[arg(long, default_value_t = 2.0)]
    high_sigma: f64,

    /// Use percentile limits LOW,HIGH instead of sigma limits (e.g. "5,99.9")
    #[arg(long, value_parser = parse_percentile_pair)]
    percentiles: Option<(f64, f64)>,
}

fn parse_percentile_pair(s: &str) -> Result<(f64, f64), String> {
    let (low, high) = s
        .split_once(',')
        .ok_or_else(|| "Percentiles must be in format 'low,high'".to_string())?;
    let low = parse_percentile(low)?;
    let high = parse_percentile(high)?;
    if low > high {
        return Err(format!("Low percentile {low} exceeds high percentile {high}"));
    }
    Ok((low, high))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let frame = load_frame(&args.path)?;
    let range = match args.percentiles {
        Some((low, high)) => percentile_range(&frame, low, high)?,
        None => sigma_range(&frame, args.low_sigma, args.high_sigma)?,
    };
    log::info!(
        "{}: {} display range {:.3} .. {:.3}, {} stretch",
        frame.identity(),
        frame.size(),
        range.vmin,
        range.vmax,
        args.stretch
    );

    let pixels = render(&frame, range, args.stretch.into());
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.path.with_extension("png"));
    save_gray_png(&pixels, &output)
        .with_context(|| format!("Failed to write preview {}", output.display()))?;

    println!("Preview saved to {}", output.display());
    Ok(())
}
