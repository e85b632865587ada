//! End-to-end runs of the difference-image pipeline.

use std::fs;

use approx::assert_relative_eq;
use ndarray::Array2;
use quicklook::pipeline::run_difference;
use shared::fits_io::load_frame;
use shared::test_util::{add_square, constant_frames, write_sequence};
use shared::{DifferenceConfig, Frame, PipelineError};
use tempfile::TempDir;

fn config_for(dir: &std::path::Path, start: &str, count: usize) -> DifferenceConfig {
    DifferenceConfig {
        source_directory: dir.to_path_buf(),
        start_filename: start.to_string(),
        frame_count: count,
        output_fits: dir.join("out").join("difference.fits"),
        ..DifferenceConfig::default()
    }
}

#[test]
fn test_difference_written_losslessly() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let sky = Frame::new(Array2::from_elem((16, 20), 1000.0));
    let frames: Vec<Frame> = (0..6)
        .map(|i| add_square(&sky, 2 + 3 * i, 6, 2, 333.3))
        .collect();
    write_sequence(dir.path(), &frames).unwrap();

    let mut config = config_for(dir.path(), "frame_0001.fits", 3);
    config.output_preview = Some(dir.path().join("out").join("difference.png"));
    let outcome = run_difference(&config).unwrap();

    assert_eq!(outcome.start_index, 1);
    assert_eq!(outcome.frames_used, 3);

    let reloaded = load_frame(&config.output_fits).unwrap();
    assert_eq!(reloaded.data(), outcome.frame.data());

    // Star positions x = 5..7, 8..10, 11..13 for frames 1, 2, 3
    assert_relative_eq!(reloaded.data()[[6, 5]], 333.3 / 2.0, epsilon = 1e-3);
    assert_relative_eq!(reloaded.data()[[6, 8]], 333.3, epsilon = 1e-3);
    assert_relative_eq!(reloaded.data()[[6, 2]], 0.0);
    assert_relative_eq!(reloaded.data()[[0, 0]], 0.0);

    let (preview_path, range) = outcome.preview.expect("preview requested");
    assert!(range.vmax > range.vmin);
    let png = image::open(&preview_path).unwrap().to_luma8();
    assert_eq!(png.dimensions(), (20, 16));
}

#[test]
fn test_range_clipped_at_sequence_end() {
    let dir = TempDir::new().unwrap();
    write_sequence(dir.path(), &constant_frames(5, 4, 4, 10.0)).unwrap();

    let outcome = run_difference(&config_for(dir.path(), "frame_0002.fits", 25)).unwrap();
    assert_eq!(outcome.frames_used, 3);
    assert!(outcome.frame.data().iter().all(|&v| v == 1.0));
    assert!(outcome.preview.is_none());
}

#[test]
fn test_single_frame_range_copies_frame() {
    let dir = TempDir::new().unwrap();
    write_sequence(dir.path(), &constant_frames(3, 4, 4, 7.0)).unwrap();

    let outcome = run_difference(&config_for(dir.path(), "frame_0001.fits", 1)).unwrap();
    assert_eq!(outcome.frames_used, 1);
    assert!(outcome.frame.data().iter().all(|&v| v == 8.0));
}

#[test]
fn test_unknown_start_frame() {
    let dir = TempDir::new().unwrap();
    write_sequence(dir.path(), &constant_frames(3, 4, 4, 0.0)).unwrap();

    let config = config_for(dir.path(), "missing.fits", 3);
    match run_difference(&config) {
        Err(PipelineError::Sequence(msg)) => assert!(msg.contains("missing.fits")),
        other => panic!("Expected Sequence error, got {other:?}"),
    }
    assert!(!config.output_fits.exists());
}

#[test]
fn test_empty_start_filename_rejected() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), "", 3);
    assert!(matches!(
        run_difference(&config),
        Err(PipelineError::Config(_))
    ));
}

#[test]
fn test_subdirectories_ignored_by_default() {
    let dir = TempDir::new().unwrap();
    write_sequence(dir.path(), &constant_frames(2, 3, 3, 0.0)).unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write_sequence(&nested, &constant_frames(2, 3, 3, 50.0)).unwrap();

    let outcome = run_difference(&config_for(dir.path(), "frame_0000.fits", 10)).unwrap();
    assert_eq!(outcome.frames_used, 2);
    assert!(outcome.frame.data().iter().all(|&v| v == 1.0));
}
