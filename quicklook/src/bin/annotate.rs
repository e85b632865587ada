//! Outline the region of interest in a FITS frame
//!
//! The frame is stretched to 8 bits, edges are found with a Sobel
//! operator and hysteresis thresholds, and the union of all edge regions
//! is outlined in green on an RGB PNG.
//!
//! ```bash
//! cargo run --bin annotate -- diff.fits --output diff_annotated.png
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use quicklook::image_proc::{save_rgb_png, EdgeParams};
use quicklook::pipeline::annotate_frame;
use quicklook::shared_args::PercentileArgs;
use shared::config::{DEFAULT_PERCENTILE_HIGH, DEFAULT_PERCENTILE_LOW};
use shared::fits_io::load_frame;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Annotate",
    about = "Draws a bounding box around detected structure in a FITS frame",
    long_about = None
)]
struct Args {
    /// FITS file to annotate
    path: PathBuf,

    /// Output PNG (defaults to <input stem>_annotated.png)
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[command(flatten)]
    percentiles: PercentileArgs,

    /// Gradient magnitude below which pixels are never edges
    #[arg(long, default_value_t = 50.0)]
    low_threshold: f32,

    /// Gradient magnitude above which pixels are always edges
    #[arg(long, default_value_t = 150.0)]
    high_threshold: f32,

    /// Margin added around the detected region in pixels
    #[arg(long, default_value_t = 10)]
    padding: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (mut low, mut high) = (DEFAULT_PERCENTILE_LOW, DEFAULT_PERCENTILE_HIGH);
    args.percentiles.apply_to(&mut low, &mut high);
    let params = EdgeParams {
        low_threshold: args.low_threshold,
        high_threshold: args.high_threshold,
        padding: args.padding,
        ..EdgeParams::default()
    };

    let frame = load_frame(&args.path)?;
    let annotation = annotate_frame(&frame, low, high, &params)?;

    match &annotation.bbox {
        Some(b) => println!(
            "Bounding box: x={} y={} width={} height={}",
            b.x_min, b.y_min, b.width, b.height
        ),
        None => println!("No bounding box detected."),
    }

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = args
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());
        args.path.with_file_name(format!("{stem}_annotated.png"))
    });
    save_rgb_png(&annotation.image, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Annotated image saved to {}", output.display());

    Ok(())
}
