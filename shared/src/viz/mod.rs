//! Display-only rendering of frames.
//!
//! Everything here maps floating-point frames into 8-bit values for human
//! viewing. The mapping clips dynamic range and quantizes, so its output
//! must never feed another numeric stage.

use thiserror::Error;

/// Error types for visualization operations.
#[derive(Debug, Error)]
pub enum VizError {
    /// Percentile bounds outside `[0, 100]` or inverted.
    #[error("Invalid percentiles: low {low}, high {high}")]
    InvalidPercentiles { low: f64, high: f64 },

    /// Display range that is not finite or has `vmin > vmax`.
    #[error("Invalid display range: [{vmin}, {vmax}]")]
    InvalidRange { vmin: f64, vmax: f64 },
}

/// Standard Result type for all visualization operations.
pub type Result<T> = std::result::Result<T, VizError>;

pub mod normalize;
pub mod stretch;

pub use normalize::{normalize, percentile, percentile_range, DisplayRange, NormalizedImage};
pub use stretch::{render, sigma_range, Stretch};
