//! Percentile-based contrast normalization.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::stretch::{render, Stretch};
use super::{Result, VizError};
use crate::frame::Frame;

/// Value range mapped onto the 8-bit display scale.
///
/// Describes a visualization only; it is never persisted as data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRange {
    pub vmin: f64,
    pub vmax: f64,
}

impl DisplayRange {
    pub fn new(vmin: f64, vmax: f64) -> Result<Self> {
        if !vmin.is_finite() || !vmax.is_finite() || vmin > vmax {
            return Err(VizError::InvalidRange { vmin, vmax });
        }
        Ok(Self { vmin, vmax })
    }

    /// True when the range is a single value (flat image)
    pub fn is_flat(&self) -> bool {
        self.vmax == self.vmin
    }
}

/// An 8-bit rendering together with the range it was stretched to.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pub pixels: Array2<u8>,
    pub range: DisplayRange,
}

/// Percentile of already sorted values with linear interpolation between
/// the closest ranks. Empty input yields 0.
pub fn percentile(sorted: &[f32], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    let a = sorted[lo] as f64;
    let b = sorted[hi] as f64;
    a + (b - a) * frac
}

/// Sorted copy of the frame with non-finite samples replaced by zero.
fn sorted_clean_values(data: ArrayView2<f32>) -> Vec<f32> {
    let mut values: Vec<f32> = data
        .iter()
        .map(|&v| if v.is_finite() { v } else { 0.0 })
        .collect();
    values.sort_unstable_by(f32::total_cmp);
    values
}

/// Display range spanning the `low`..`high` percentiles of the frame.
pub fn percentile_range(frame: &Frame, low: f64, high: f64) -> Result<DisplayRange> {
    let valid = |p: f64| (0.0..=100.0).contains(&p);
    if !valid(low) || !valid(high) || low > high {
        return Err(VizError::InvalidPercentiles { low, high });
    }
    let sorted = sorted_clean_values(frame.view());
    DisplayRange::new(percentile(&sorted, low), percentile(&sorted, high))
}

/// Map a frame onto `0..=255` by percentile clipping.
///
/// Non-finite samples count as zero. Values are clipped to the
/// `low`/`high` percentiles of the cleaned frame and scaled linearly, so
/// the output is monotone in the input. A flat frame renders as all zeros.
pub fn normalize(frame: &Frame, low: f64, high: f64) -> Result<NormalizedImage> {
    let range = percentile_range(frame, low, high)?;
    Ok(NormalizedImage {
        pixels: render(frame, range, Stretch::Linear),
        range,
    })
}
