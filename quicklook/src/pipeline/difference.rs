use std::path::PathBuf;

use log::info;
use shared::fits_io::write_frame;
use shared::viz::{normalize, DisplayRange};
use shared::{DifferenceConfig, Frame, Result, Sequence};

use crate::image_proc::{difference, save_gray_png};

/// Result of a difference run.
#[derive(Debug, Clone)]
pub struct DifferenceOutcome {
    /// The averaged difference, exactly as written to FITS
    pub frame: Frame,
    pub start_index: usize,
    /// Frames actually covered after clipping at the sequence end
    pub frames_used: usize,
    pub output_fits: PathBuf,
    /// Preview path and the range it was stretched to, when requested
    pub preview: Option<(PathBuf, DisplayRange)>,
}

/// Compute the averaged difference image for the configured range.
///
/// The range starts at the frame named `start_filename` and covers up to
/// `frame_count` frames. The result is written losslessly as 32-bit float
/// FITS, plus an optional percentile-stretched PNG preview.
///
/// # Errors
/// `Sequence` if the directory is unusable or the start frame is not in
/// it; load, shape and write errors are fatal here.
pub fn run_difference(config: &DifferenceConfig) -> Result<DifferenceOutcome> {
    config.validate()?;
    let mut sequence =
        Sequence::discover(&config.source_directory, config.recursive, &config.ordering)?;
    let start_index = sequence.position_of(&config.start_filename)?;
    let frames_used = config.frame_count.min(sequence.len() - start_index);

    info!(
        "Differencing {} frames starting at {}",
        frames_used, config.start_filename
    );
    let frame = difference(&mut sequence, start_index, config.frame_count)?;
    write_frame(&frame, &config.output_fits)?;
    info!("Difference image saved to {}", config.output_fits.display());

    let preview = match &config.output_preview {
        Some(path) => {
            let normalized = normalize(&frame, config.percentile_low, config.percentile_high)?;
            save_gray_png(&normalized.pixels, path)?;
            info!("Preview saved to {}", path.display());
            Some((path.clone(), normalized.range))
        }
        None => None,
    };

    Ok(DifferenceOutcome {
        frame,
        start_index,
        frames_used,
        output_fits: config.output_fits.clone(),
        preview,
    })
}
