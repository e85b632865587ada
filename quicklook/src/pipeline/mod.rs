//! End-to-end runs over a FITS sequence.
//!
//! Each entry point takes its configuration by reference, discovers the
//! sequence, and writes its outputs. Errors that prevent a run from
//! starting are returned; per-frame failures in the background batch are
//! logged and recorded in the [`BatchReport`].

pub mod annotate;
pub mod background;
pub mod difference;

pub use annotate::{annotate_frame, Annotation, ANNOTATION_THICKNESS};
pub use background::{
    run_background_subtraction, run_background_subtraction_with, target_range, BatchReport,
    FrameEvent, ProcessedFrame, SkippedFrame,
};
pub use difference::{run_difference, DifferenceOutcome};
