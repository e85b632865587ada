//! Error type shared by every pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

use crate::image_size::ImageSize;
use crate::viz::VizError;

/// Errors raised while loading, ordering or processing frames.
///
/// `Load`, `ShapeMismatch` and `Write` are per-frame failures: batch runs
/// report them and move on to the next frame. `Sequence` and
/// `InsufficientFrames` raised while establishing a run abort it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File missing, unreadable, or without primary image data.
    #[error("Failed to load frame '{path}': {reason}")]
    Load { path: PathBuf, reason: String },

    /// The sequence could not be established or a named frame is not in it.
    #[error("Sequence error: {0}")]
    Sequence(String),

    #[error("Insufficient frames: {required} required, {available} available")]
    InsufficientFrames { required: usize, available: usize },

    #[error("Frame {frame} is {actual}, expected {expected}")]
    ShapeMismatch {
        frame: String,
        expected: ImageSize,
        actual: ImageSize,
    },

    #[error("Failed to write '{path}': {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Viz(#[from] VizError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
