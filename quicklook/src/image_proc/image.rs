use std::fs;
use std::path::Path;

use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::Array2;
use shared::{PipelineError, Result};

use super::thresholding::BoundingBox;

/// Annotation colour for detected regions
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Converts an ndarray Array2<u8> to an image::GrayImage
///
/// Array indices `[y, x]` map to pixel coordinates `(x, y)`; array
/// dimensions are (height, width) while image dimensions are (width, height).
pub fn array2_to_gray_image(arr: &Array2<u8>) -> GrayImage {
    let (height, width) = arr.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([arr[[y as usize, x as usize]]])
    })
}

/// Gray array promoted to an RGB image with equal channels
pub fn gray_to_rgb_image(arr: &Array2<u8>) -> RgbImage {
    let (height, width) = arr.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let v = arr[[y as usize, x as usize]];
        Rgb([v, v, v])
    })
}

/// Gray image promoted to RGB with a rectangle outline drawn over it.
///
/// The outline covers the half-open box `[x_min, x_max) x [y_min, y_max)`
/// and grows inward from its edges, `thickness` pixels wide, clipped to
/// the image. The right and bottom strokes therefore end at `x_max - 1`
/// and `y_max - 1`, one pixel inside a stroke centred on the inclusive
/// corner `(x_max, y_max)`.
pub fn draw_bounding_box(arr: &Array2<u8>, bbox: &BoundingBox, thickness: usize) -> RgbImage {
    let (height, width) = arr.dim();
    let mut img = gray_to_rgb_image(arr);

    let x_end = bbox.x_max().min(width);
    let y_end = bbox.y_max().min(height);
    if bbox.x_min >= x_end || bbox.y_min >= y_end || thickness == 0 {
        return img;
    }

    for y in bbox.y_min..y_end {
        for x in bbox.x_min..x_end {
            let on_border = x < bbox.x_min + thickness
                || x + thickness >= x_end
                || y < bbox.y_min + thickness
                || y + thickness >= y_end;
            if on_border {
                img.put_pixel(x as u32, y as u32, BOX_COLOR);
            }
        }
    }

    img
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| PipelineError::write(path, e))
        }
        _ => Ok(()),
    }
}

/// Write an 8-bit grayscale PNG, creating parent directories.
pub fn save_gray_png(pixels: &Array2<u8>, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    array2_to_gray_image(pixels)
        .save(path)
        .map_err(|e| PipelineError::write(path, e))
}

/// Write an RGB PNG, creating parent directories.
pub fn save_rgb_png(img: &RgbImage, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    img.save(path).map_err(|e| PipelineError::write(path, e))
}
