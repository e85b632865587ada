//! Shared components for the FITS sequence quicklook tools.
//!
//! Holds everything the processing binaries agree on: the in-memory frame
//! model, FITS reading and writing, sequence discovery and ordering, the
//! pipeline configuration values and display-only contrast normalization.

pub mod config;
pub mod error;
pub mod fits_header;
pub mod fits_io;
pub mod frame;
pub mod image_size;
pub mod sequence;
pub mod test_util;
pub mod viz;

pub use config::{BackgroundConfig, DifferenceConfig};
pub use error::{PipelineError, Result};
pub use frame::Frame;
pub use image_size::ImageSize;
pub use sequence::{FrameCache, FrameSource, Sequence, SequenceOrder};
