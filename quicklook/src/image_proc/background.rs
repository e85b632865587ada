//! Median background estimation from neighbouring frames.
//!
//! Static and slowly varying signal (sky glow, gradients, fixed-pattern
//! structure) looks the same in adjacent exposures, while transients do
//! not. The per-pixel median of the frames around a target therefore
//! estimates what the target would look like without its transients.

use log::debug;
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use shared::{Frame, FrameSource, PipelineError, Result};

use super::gaussian::gaussian_blur;

/// Sequence indices whose frames estimate the background of `target`.
///
/// The window spans `radius` frames on each side, is clipped at both ends
/// of the sequence (no wraparound, no padding) and never contains `target`
/// itself, so it holds at most `2 * radius` indices.
pub fn window_indices(len: usize, target: usize, radius: usize) -> Vec<usize> {
    let start = target.saturating_sub(radius);
    let end = target.saturating_add(radius).saturating_add(1).min(len);
    (start..end).filter(|&i| i != target).collect()
}

/// Median of `values`; even counts average the two middle values.
///
/// Reorders `values`. Panics on empty input.
fn median_mut(values: &mut [f32]) -> f32 {
    let len = values.len();
    let mid = len / 2;
    let (left, upper, _) = values.select_nth_unstable_by(mid, f32::total_cmp);
    let upper = *upper;
    if len % 2 == 1 {
        upper
    } else {
        let lower = left.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        (lower + upper) * 0.5
    }
}

/// Per-pixel median across `frames`.
///
/// # Errors
/// `InsufficientFrames` for an empty slice, `ShapeMismatch` when the
/// frames differ in size.
pub fn median_stack(frames: &[Frame]) -> Result<Array2<f32>> {
    let first = frames.first().ok_or(PipelineError::InsufficientFrames {
        required: 1,
        available: 0,
    })?;
    for frame in &frames[1..] {
        first.ensure_same_size(frame)?;
    }

    let mut output = first.size().zeros();
    output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(y, mut row)| {
            let mut scratch = Vec::with_capacity(frames.len());
            for (x, out) in row.iter_mut().enumerate() {
                scratch.clear();
                scratch.extend(frames.iter().map(|f| f.data()[[y, x]]));
                *out = median_mut(&mut scratch);
            }
        });
    Ok(output)
}

/// Estimate the background of frame `target_index`.
///
/// Loads the window from [`window_indices`], takes the per-pixel median
/// and smooths it with a Gaussian of `blur_sigma` pixels to hide
/// pixel-level median artefacts while keeping large-scale gradients.
///
/// Returns `Ok(None)` when the window is empty (a one-frame sequence, or
/// radius 0): no estimate is available and the caller should skip the
/// frame rather than subtract nothing.
///
/// The full window is reloaded and re-medianed for every target, so the
/// cost is O(radius x frame size) per frame. Wrap the source in a
/// `FrameCache` to avoid decoding files repeatedly.
pub fn estimate_background<S>(
    source: &mut S,
    target_index: usize,
    radius: usize,
    blur_sigma: f64,
) -> Result<Option<Frame>>
where
    S: FrameSource + ?Sized,
{
    let len = source.len();
    if target_index >= len {
        return Err(PipelineError::InsufficientFrames {
            required: target_index + 1,
            available: len,
        });
    }

    let window = window_indices(len, target_index, radius);
    if window.is_empty() {
        debug!("No background window for frame {target_index}");
        return Ok(None);
    }

    let frames = window
        .iter()
        .map(|&i| source.load(i))
        .collect::<Result<Vec<_>>>()?;
    let raw = median_stack(&frames)?;
    let smoothed = gaussian_blur(raw.view(), blur_sigma);

    debug!(
        "Background for frame {target_index} from {} frames ({}..={})",
        window.len(),
        window[0],
        window[window.len() - 1]
    );
    Ok(Some(Frame::new(smoothed).with_index(target_index)))
}

/// `target - background`, with negative residuals clipped to zero.
pub fn subtract_background(target: &Frame, background: &Frame) -> Result<Frame> {
    target.ensure_same_size(background)?;
    let data = (target.data() - background.data()).mapv_into(|v| v.max(0.0));
    Ok(target.derive(data))
}
