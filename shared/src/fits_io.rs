//! Reading and writing frames as FITS primary-HDU images.

use std::path::Path;

use fitsio::hdu::HduInfo;
use fitsio::images::{ImageDescription, ImageType};
use fitsio::FitsFile;
use log::debug;
use ndarray::Array2;

use crate::error::{PipelineError, Result};
use crate::frame::Frame;
use crate::image_size::ImageSize;

/// Load the primary image of a FITS file as an `f32` frame.
///
/// Integer data is converted with BSCALE/BZERO applied by cfitsio. A 3-D
/// cube is accepted only when it holds a single plane.
///
/// # Errors
/// `PipelineError::Load` when the file is missing or unreadable, the
/// primary HDU is not an image, or it carries no image data (`NAXIS = 0`).
pub fn load_frame(path: &Path) -> Result<Frame> {
    if !path.is_file() {
        return Err(PipelineError::load(path, "file not found"));
    }

    let mut fptr = FitsFile::open(path).map_err(|e| PipelineError::load(path, e))?;
    let hdu = fptr
        .primary_hdu()
        .map_err(|e| PipelineError::load(path, e))?;

    let shape = match &hdu.info {
        HduInfo::ImageInfo { shape, .. } => shape.clone(),
        HduInfo::TableInfo { .. } => {
            return Err(PipelineError::load(
                path,
                "primary HDU is a table, not an image",
            ))
        }
        HduInfo::AnyInfo => return Err(PipelineError::load(path, "unknown primary HDU type")),
    };
    let size = size_from_shape(&shape).map_err(|reason| PipelineError::load(path, reason))?;

    let pixels: Vec<f32> = hdu
        .read_image(&mut fptr)
        .map_err(|e| PipelineError::load(path, e))?;
    if pixels.len() != size.pixel_count() {
        return Err(PipelineError::load(
            path,
            format!(
                "expected {} pixels for {size}, read {}",
                size.pixel_count(),
                pixels.len()
            ),
        ));
    }

    let data =
        Array2::from_shape_vec(size.shape(), pixels).map_err(|e| PipelineError::load(path, e))?;
    debug!("Loaded {} ({size})", path.display());
    Ok(Frame::new(data).with_path(path))
}

/// Write a frame as a 32-bit float primary image, replacing any existing file.
///
/// This is the lossless output path: reloading the file with [`load_frame`]
/// yields the same samples bit for bit.
pub fn write_frame(frame: &Frame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    // cfitsio refuses to create over an existing file
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    let size = frame.size();
    let description = ImageDescription {
        data_type: ImageType::Float,
        // FITS uses [NAXIS2, NAXIS1] = [height, width]
        dimensions: &[size.height, size.width],
    };

    let mut fptr = FitsFile::create(path)
        .with_custom_primary(&description)
        .open()
        .map_err(|e| PipelineError::write(path, e))?;
    let hdu = fptr
        .primary_hdu()
        .map_err(|e| PipelineError::write(path, e))?;

    let pixels: Vec<f32> = frame.data().iter().copied().collect();
    hdu.write_image(&mut fptr, &pixels)
        .map_err(|e| PipelineError::write(path, e))?;

    debug!("Wrote {} ({size})", path.display());
    Ok(())
}

/// Map a cfitsio image shape (slowest axis first) to frame dimensions.
fn size_from_shape(shape: &[usize]) -> std::result::Result<ImageSize, String> {
    match shape {
        [] => Err("primary HDU contains no image data".to_string()),
        [height, width] => Ok(ImageSize::from_width_height(*width, *height)),
        [1, height, width] => Ok(ImageSize::from_width_height(*width, *height)),
        other => Err(format!(
            "expected a 2-D image, found {} axes {:?}",
            other.len(),
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    #[test]
    fn test_size_from_shape() {
        assert_eq!(
            size_from_shape(&[3, 5]).unwrap(),
            ImageSize::from_width_height(5, 3)
        );
        assert_eq!(
            size_from_shape(&[1, 4, 6]).unwrap(),
            ImageSize::from_width_height(6, 4)
        );
        assert!(size_from_shape(&[]).is_err());
        assert!(size_from_shape(&[3, 4, 6]).is_err());
        assert!(size_from_shape(&[7]).is_err());
    }

    #[test]
    fn test_write_then_load_is_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.fits");

        let data = Array2::from_shape_fn((7, 11), |(y, x)| {
            (y as f32) * 1000.25 + (x as f32) * 0.001 - 3.5
        });
        let frame = Frame::new(data.clone());
        write_frame(&frame, &path).unwrap();

        let loaded = load_frame(&path).unwrap();
        assert_eq!(loaded.size(), ImageSize::from_width_height(11, 7));
        assert_eq!(loaded.path(), Some(path.as_path()));
        for (a, b) in loaded.data().iter().zip(data.iter()) {
            assert_relative_eq!(*a, *b);
        }
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.fits");

        write_frame(&Frame::new(Array2::from_elem((2, 2), 1.0)), &path).unwrap();
        write_frame(&Frame::new(Array2::from_elem((3, 4), 2.0)), &path).unwrap();

        let loaded = load_frame(&path).unwrap();
        assert_eq!(loaded.size(), ImageSize::from_width_height(4, 3));
        assert!(loaded.data().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.fits");
        assert!(matches!(
            load_frame(&path),
            Err(PipelineError::Load { .. })
        ));
    }

    #[test]
    fn test_load_empty_primary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.fits");
        FitsFile::create(&path).open().unwrap();

        match load_frame(&path) {
            Err(PipelineError::Load { reason, .. }) => assert!(reason.contains("no image data")),
            other => panic!("expected Load error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_garbage_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.fits");
        std::fs::write(&path, b"this is not a FITS file").unwrap();
        assert!(matches!(
            load_frame(&path),
            Err(PipelineError::Load { .. })
        ));
    }
}
