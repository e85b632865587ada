//! Averaged absolute frame-to-frame differences.

use log::debug;
use ndarray::Zip;
use shared::{Frame, FrameSource, PipelineError, Result};

/// Average absolute difference between consecutive frames.
///
/// Covers frames `start_index .. min(start_index + frame_count, len)` and
/// returns `sum(|f[i] - f[i-1]|) / pairs` over the consecutive pairs in
/// that range. Static content cancels; anything that changes between
/// exposures (satellites, meteors, flares) remains.
///
/// When the range holds a single frame there are no pairs, and that frame
/// is returned unchanged. Each frame is loaded once.
///
/// # Errors
/// `InsufficientFrames` if `frame_count` is zero or `start_index` is past
/// the end, plus any load or shape error.
pub fn difference<S>(source: &mut S, start_index: usize, frame_count: usize) -> Result<Frame>
where
    S: FrameSource + ?Sized,
{
    let len = source.len();
    if frame_count == 0 || start_index >= len {
        return Err(PipelineError::InsufficientFrames {
            required: start_index + 1,
            available: len,
        });
    }
    let end_index = start_index.saturating_add(frame_count).min(len);

    let first = source.load(start_index)?;
    let pairs = end_index - start_index - 1;
    if pairs == 0 {
        return Ok(first);
    }

    let mut accumulator = first.size().zeros();
    let mut previous = first;
    for i in start_index + 1..end_index {
        let current = source.load(i)?;
        previous.ensure_same_size(&current)?;
        Zip::from(&mut accumulator)
            .and(current.data())
            .and(previous.data())
            .for_each(|acc, &c, &p| *acc += (c - p).abs());
        previous = current;
    }

    let divisor = pairs as f32;
    accumulator.mapv_inplace(|v| v / divisor);
    debug!("Averaged {pairs} differences over frames {start_index}..{end_index}");
    Ok(Frame::new(accumulator).with_index(start_index))
}
