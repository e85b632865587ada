//! Synthetic frames and on-disk sequences for tests.

use std::path::Path;

use ndarray::Array2;

use crate::error::Result;
use crate::fits_io::write_frame;
use crate::frame::Frame;
use crate::sequence::Sequence;

/// `count` frames of `width`x`height`, frame `i` filled with `start + i`.
pub fn constant_frames(count: usize, width: usize, height: usize, start: f32) -> Vec<Frame> {
    (0..count)
        .map(|i| Frame::new(Array2::from_elem((height, width), start + i as f32)))
        .collect()
}

/// Frame whose value at `(y, x)` is `base + x * dx + y * dy`.
pub fn ramp_frame(width: usize, height: usize, base: f32, dx: f32, dy: f32) -> Frame {
    Frame::new(Array2::from_shape_fn((height, width), |(y, x)| {
        base + x as f32 * dx + y as f32 * dy
    }))
}

/// Add a square of `value` with its top-left corner at `(x, y)`.
pub fn add_square(frame: &Frame, x: usize, y: usize, side: usize, value: f32) -> Frame {
    let mut data = frame.data().clone();
    for row in y..(y + side).min(frame.height()) {
        for col in x..(x + side).min(frame.width()) {
            data[[row, col]] += value;
        }
    }
    frame.derive(data)
}

/// Write `frames` into `dir` as `frame_0000.fits`, `frame_0001.fits`, ...
/// and return them as a sequence in that order.
pub fn write_sequence(dir: &Path, frames: &[Frame]) -> Result<Sequence> {
    let mut paths = Vec::with_capacity(frames.len());
    for (i, frame) in frames.iter().enumerate() {
        let path = dir.join(format!("frame_{i:04}.fits"));
        write_frame(frame, &path)?;
        paths.push(path);
    }
    Ok(Sequence::from_paths(paths))
}
