use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use shared::viz::{normalize, DisplayRange};
use shared::{BackgroundConfig, FrameCache, FrameSource, PipelineError, Result, Sequence};

use crate::image_proc::{estimate_background, save_gray_png, sharpen, subtract_background};

/// A frame that produced a preview.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFrame {
    pub index: usize,
    pub source: PathBuf,
    pub output: PathBuf,
    /// Percentile range the preview was stretched to
    pub range: DisplayRange,
}

/// A frame that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFrame {
    pub index: usize,
    pub source: PathBuf,
    pub reason: String,
}

/// Outcome of a background-subtraction run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Frames in the discovered sequence
    pub total_frames: usize,
    /// Target frames considered, in sequence order
    pub targets: usize,
    pub processed: Vec<ProcessedFrame>,
    pub skipped: Vec<SkippedFrame>,
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug)]
pub enum FrameEvent<'a> {
    /// Emitted once before the first target with the number of targets
    Started { targets: usize },
    Processed(&'a ProcessedFrame),
    Skipped(&'a SkippedFrame),
}

/// Target indices for a sequence of `len` frames.
///
/// With `full_window_only` only frames with `radius` neighbours on both
/// sides qualify, and fewer than `2 * radius + 1` frames is an error.
/// Otherwise every frame is a target.
pub fn target_range(len: usize, radius: usize, full_window_only: bool) -> Result<Range<usize>> {
    if !full_window_only {
        return Ok(0..len);
    }
    let required = radius
        .checked_mul(2)
        .and_then(|r| r.checked_add(1))
        .ok_or_else(|| PipelineError::Config(format!("window_radius {radius} is too large")))?;
    if len < required {
        return Err(PipelineError::InsufficientFrames {
            required,
            available: len,
        });
    }
    Ok(radius..len - radius)
}

/// Run background subtraction over the configured directory.
pub fn run_background_subtraction(config: &BackgroundConfig) -> Result<BatchReport> {
    run_background_subtraction_with(config, |_| {})
}

/// Like [`run_background_subtraction`], reporting progress to `on_event`.
///
/// For every target: subtract the median background of its neighbours
/// (negatives clipped to zero), sharpen, stretch to the configured
/// percentiles and write `<output_directory>/<stem>.png`.
pub fn run_background_subtraction_with<F>(
    config: &BackgroundConfig,
    mut on_event: F,
) -> Result<BatchReport>
where
    F: FnMut(&FrameEvent),
{
    config.validate()?;
    let sequence = Sequence::discover(&config.source_directory, config.recursive, &config.ordering)?;
    let targets = target_range(sequence.len(), config.window_radius, config.full_window_only)?;
    fs::create_dir_all(&config.output_directory)?;

    let mut source: Box<dyn FrameSource> = if config.cache_frames {
        let capacity = config.window_radius.saturating_mul(2).saturating_add(1);
        Box::new(FrameCache::new(sequence.clone(), capacity))
    } else {
        Box::new(sequence.clone())
    };

    let mut report = BatchReport {
        total_frames: sequence.len(),
        targets: targets.len(),
        ..BatchReport::default()
    };
    info!(
        "Processing frames {}..{} of {} (window radius {})",
        targets.start,
        targets.end,
        sequence.len(),
        config.window_radius
    );
    on_event(&FrameEvent::Started {
        targets: targets.len(),
    });

    for index in targets {
        let path = sequence.paths()[index].clone();
        match process_frame(source.as_mut(), index, &path, config) {
            Ok(Some(processed)) => {
                debug!("Wrote {}", processed.output.display());
                on_event(&FrameEvent::Processed(&processed));
                report.processed.push(processed);
            }
            Ok(None) => {
                let skipped = SkippedFrame {
                    index,
                    source: path,
                    reason: "no neighbouring frames for a background estimate".to_string(),
                };
                warn!("Skipping {}: {}", skipped.source.display(), skipped.reason);
                on_event(&FrameEvent::Skipped(&skipped));
                report.skipped.push(skipped);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                let skipped = SkippedFrame {
                    index,
                    source: path,
                    reason: e.to_string(),
                };
                on_event(&FrameEvent::Skipped(&skipped));
                report.skipped.push(skipped);
            }
        }
    }

    info!(
        "Background subtraction done: {} written, {} skipped",
        report.processed.len(),
        report.skipped.len()
    );
    Ok(report)
}

fn process_frame(
    source: &mut dyn FrameSource,
    index: usize,
    path: &Path,
    config: &BackgroundConfig,
) -> Result<Option<ProcessedFrame>> {
    let target = source.load(index)?;
    let Some(background) =
        estimate_background(source, index, config.window_radius, config.blur_sigma)?
    else {
        return Ok(None);
    };

    let residual = subtract_background(&target, &background)?;
    let sharpened = sharpen(&residual, config.sharpen_sigma, config.sharpen_strength);
    let preview = normalize(&sharpened, config.percentile_low, config.percentile_high)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("frame_{index:05}"));
    let output = config.output_directory.join(format!("{stem}.png"));
    save_gray_png(&preview.pixels, &output)?;

    Ok(Some(ProcessedFrame {
        index,
        source: path.to_path_buf(),
        output,
        range: preview.range,
    }))
}
