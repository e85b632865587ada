//! In-memory representation of a single exposure.

use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView2};

use crate::error::{PipelineError, Result};
use crate::image_size::ImageSize;

/// One 2-D exposure held as 32-bit floats.
///
/// Samples are always `f32` whatever the on-disk BITPIX was, so every stage
/// downstream of the loader does its arithmetic at the same precision.
/// Processing stages never mutate a frame; they build a new one with
/// [`Frame::derive`] so the source identity follows the data.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    data: Array2<f32>,
    path: Option<PathBuf>,
    index: Option<usize>,
}

impl Frame {
    pub fn new(data: Array2<f32>) -> Self {
        Self {
            data,
            path: None,
            index: None,
        }
    }

    /// Attach the file this frame was read from.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach the frame's position within its sequence.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// New frame carrying `data` and this frame's identity.
    pub fn derive(&self, data: Array2<f32>) -> Self {
        Self {
            data,
            path: self.path.clone(),
            index: self.index,
        }
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::of_array(&self.data)
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Human-readable identity used in log lines and error messages.
    pub fn identity(&self) -> String {
        match (&self.path, self.index) {
            (Some(path), Some(index)) => format!("#{index} ({})", path.display()),
            (Some(path), None) => path.display().to_string(),
            (None, Some(index)) => format!("#{index}"),
            (None, None) => "<in-memory frame>".to_string(),
        }
    }

    /// Fails with `ShapeMismatch` unless `other` has the same dimensions.
    pub fn ensure_same_size(&self, other: &Frame) -> Result<()> {
        let expected = self.size();
        let actual = other.size();
        if expected != actual {
            return Err(PipelineError::ShapeMismatch {
                frame: other.identity(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_keeps_identity() {
        let frame = Frame::new(Array2::zeros((2, 3)))
            .with_path("/data/a.fits")
            .with_index(4);
        let derived = frame.derive(Array2::ones((2, 3)));

        assert_eq!(derived.path(), Some(Path::new("/data/a.fits")));
        assert_eq!(derived.index(), Some(4));
        assert_eq!(derived.data()[[1, 2]], 1.0);
        // Original untouched
        assert_eq!(frame.data()[[1, 2]], 0.0);
    }

    #[test]
    fn test_identity_formats() {
        assert_eq!(Frame::new(Array2::zeros((1, 1))).identity(), "<in-memory frame>");
        assert_eq!(
            Frame::new(Array2::zeros((1, 1))).with_index(7).identity(),
            "#7"
        );
    }

    #[test]
    fn test_ensure_same_size() {
        let a = Frame::new(Array2::zeros((2, 3)));
        let b = Frame::new(Array2::zeros((2, 3)));
        let c = Frame::new(Array2::zeros((3, 2))).with_index(1);

        assert!(a.ensure_same_size(&b).is_ok());
        match a.ensure_same_size(&c) {
            Err(PipelineError::ShapeMismatch {
                frame,
                expected,
                actual,
            }) => {
                assert_eq!(frame, "#1");
                assert_eq!(expected, ImageSize::from_width_height(3, 2));
                assert_eq!(actual, ImageSize::from_width_height(2, 3));
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }
}
