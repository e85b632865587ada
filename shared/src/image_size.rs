//! Image dimensions and size utilities

use ndarray::{Array2, ArrayBase, Ix2, RawData};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame dimensions
///
/// Arrays holding frames are indexed `[row, column]`, so an array of this
/// size has shape `(height, width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
}

impl ImageSize {
    /// Create a new ImageSize
    pub fn from_width_height(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Size of a 2-D array, reading its `(rows, columns)` shape
    pub fn of_array<S: RawData>(array: &ArrayBase<S, Ix2>) -> Self {
        let (height, width) = array.dim();
        Self { width, height }
    }

    /// Create a zero-filled f32 array with this size
    pub fn zeros(&self) -> Array2<f32> {
        Array2::zeros((self.height, self.width))
    }

    /// Get total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Shape tuple in array order, `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_array_reads_rows_as_height() {
        let arr = Array2::<f32>::zeros((3, 5));
        let size = ImageSize::of_array(&arr);
        assert_eq!(size.width, 5);
        assert_eq!(size.height, 3);
        assert_eq!(size.pixel_count(), 15);
        assert_eq!(size.shape(), (3, 5));
    }

    #[test]
    fn test_display() {
        assert_eq!(ImageSize::from_width_height(640, 480).to_string(), "640x480");
    }

    #[test]
    fn test_zeros_shape() {
        let size = ImageSize::from_width_height(4, 2);
        assert_eq!(size.zeros().dim(), (2, 4));
    }
}
