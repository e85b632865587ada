//! Stretch functions and mean/sigma display limits for single-frame viewing.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::normalize::DisplayRange;
use super::Result;
use crate::frame::Frame;

/// Log stretch scale, `log(a*x + 1) / log(a + 1)`
const LOG_A: f64 = 1000.0;
/// Asinh stretch softening, `asinh(x / a) / asinh(1 / a)`
const ASINH_A: f64 = 0.1;

/// Transfer function applied after clipping to the display range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stretch {
    #[default]
    Linear,
    Sqrt,
    Log,
    Asinh,
}

impl Stretch {
    /// Map `t` in `[0, 1]` onto `[0, 1]`; every variant is monotone
    /// non-decreasing and fixes both endpoints.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Stretch::Linear => t,
            Stretch::Sqrt => t.sqrt(),
            Stretch::Log => (LOG_A * t + 1.0).ln() / (LOG_A + 1.0).ln(),
            Stretch::Asinh => (t / ASINH_A).asinh() / (1.0 / ASINH_A).asinh(),
        }
    }
}

/// Display range `[mean - low_sigma * std, mean + high_sigma * std]`.
///
/// Statistics skip non-finite samples; std is the population value.
pub fn sigma_range(frame: &Frame, low_sigma: f64, high_sigma: f64) -> Result<DisplayRange> {
    let (count, sum, sum_sq) = frame
        .data()
        .iter()
        .filter(|v| v.is_finite())
        .fold((0usize, 0.0f64, 0.0f64), |(n, s, sq), &v| {
            let v = v as f64;
            (n + 1, s + v, sq + v * v)
        });
    if count == 0 {
        return DisplayRange::new(0.0, 0.0);
    }
    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
    let std = variance.sqrt();
    DisplayRange::new(mean - low_sigma * std, mean + high_sigma * std)
}

/// Render a frame to 8 bits: clip to `range`, rescale to `[0, 1]`, apply
/// the stretch and round onto `0..=255`. Non-finite samples count as zero;
/// a flat range renders as all zeros.
pub fn render(frame: &Frame, range: DisplayRange, stretch: Stretch) -> Array2<u8> {
    if range.is_flat() {
        return Array2::zeros(frame.data().raw_dim());
    }
    let span = range.vmax - range.vmin;
    frame.data().mapv(|v| {
        let v = if v.is_finite() { v as f64 } else { 0.0 };
        let t = (v.clamp(range.vmin, range.vmax) - range.vmin) / span;
        (stretch.apply(t) * 255.0).round() as u8
    })
}
