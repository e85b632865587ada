//! Print the structure and header of a FITS file
//!
//! Lists every HDU (index, name, type, BITPIX and shape) followed by the
//! primary header cards.
//!
//! ```bash
//! cargo run --bin fits_info -- frame_0001.fits
//! cargo run --bin fits_info -- frame_0001.fits --all-headers
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use shared::fits_header::read_hdus;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "FITS Info",
    about = "Lists the HDUs of a FITS file and prints its header",
    long_about = None
)]
struct Args {
    /// FITS file to inspect
    path: PathBuf,

    /// Print the header of every HDU, not just the primary
    #[arg(long)]
    all_headers: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let hdus = read_hdus(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;

    println!("Filename: {}", args.path.display());
    println!("No.  Name       Type         Cards  Format");
    for hdu in &hdus {
        println!("{hdu}");
    }

    let shown = if args.all_headers { hdus.len() } else { 1 };
    for hdu in hdus.iter().take(shown) {
        println!();
        println!("--- HDU {} ({}) ---", hdu.index, hdu.kind);
        println!("{}", hdu.header);
    }

    Ok(())
}
