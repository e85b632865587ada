//! Quicklook processing for astronomical FITS image sequences.
//!
//! Two pipelines sit on top of the frame model in `shared`:
//!
//! - **Background subtraction**: for each frame, estimate the static sky
//!   as the blurred per-pixel median of its neighbours, subtract it,
//!   sharpen with an unsharp mask and write a contrast-stretched PNG.
//! - **Sequence differencing**: average the absolute difference between
//!   consecutive frames over a range, highlighting anything that moved.
//!   The result is kept losslessly as FITS with an optional PNG preview.
//!
//! The `image_proc` module holds the per-frame algorithms; `pipeline`
//! runs them over a directory of frames.

pub mod image_proc;
pub mod pipeline;
pub mod shared_args;

pub use image_proc::background::{estimate_background, subtract_background, window_indices};
pub use image_proc::difference::difference;
pub use image_proc::gaussian::gaussian_blur;
pub use image_proc::sharpen::sharpen;
pub use pipeline::{run_background_subtraction, run_difference, BatchReport, DifferenceOutcome};
