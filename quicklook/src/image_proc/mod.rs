//! Image processing for FITS frame sequences
//!
//! Gaussian smoothing, median background estimation, unsharp masking,
//! frame differencing and edge-based region detection. Every function
//! takes frames by reference and returns new frames.

pub mod background;
pub mod difference;
pub mod gaussian;
pub mod image;
pub mod sharpen;
pub mod thresholding;

// Re-export key functionality for easier access
pub use background::{estimate_background, median_stack, subtract_background, window_indices};
pub use difference::difference;
pub use gaussian::{gaussian_blur, gaussian_kernel_1d};
pub use self::image::{
    array2_to_gray_image, draw_bounding_box, gray_to_rgb_image, save_gray_png, save_rgb_png,
};
pub use sharpen::sharpen;
pub use thresholding::{find_bounding_box, BoundingBox, EdgeParams};
