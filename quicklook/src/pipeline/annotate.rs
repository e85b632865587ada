use image::RgbImage;
use log::info;
use shared::viz::{normalize, DisplayRange};
use shared::{Frame, Result};

use crate::image_proc::{
    draw_bounding_box, find_bounding_box, gray_to_rgb_image, BoundingBox, EdgeParams,
};

/// Outline width of the annotation rectangle in pixels
pub const ANNOTATION_THICKNESS: usize = 2;

/// A normalized frame with the detected region outlined.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub image: RgbImage,
    /// `None` when no edges were found; the image is then unmarked
    pub bbox: Option<BoundingBox>,
    pub range: DisplayRange,
}

/// Stretch `frame` to the `low`/`high` percentiles, detect edge regions on
/// the 8-bit result and outline their padded union in green.
pub fn annotate_frame(frame: &Frame, low: f64, high: f64, params: &EdgeParams) -> Result<Annotation> {
    let normalized = normalize(frame, low, high)?;
    let bbox = find_bounding_box(normalized.pixels.view(), params);

    let image = match &bbox {
        Some(b) => {
            info!(
                "Bounding box at ({}, {}) size {}x{}",
                b.x_min, b.y_min, b.width, b.height
            );
            draw_bounding_box(&normalized.pixels, b, ANNOTATION_THICKNESS)
        }
        None => {
            info!("No bounding box detected for {}", frame.identity());
            gray_to_rgb_image(&normalized.pixels)
        }
    };

    Ok(Annotation {
        image,
        bbox,
        range: normalized.range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_proc::image::BOX_COLOR;
    use ndarray::Array2;
    use shared::test_util::add_square;

    #[test]
    fn test_annotates_bright_square() {
        let sky = Frame::new(Array2::from_elem((64, 64), 100.0));
        let frame = add_square(&sky, 30, 20, 6, 5000.0);

        let annotation = annotate_frame(&frame, 5.0, 99.9, &EdgeParams::default()).unwrap();
        let bbox = annotation.bbox.expect("square should be detected");

        assert!(bbox.x_min <= 30 && bbox.y_min <= 20);
        assert!(bbox.x_max() >= 36 && bbox.y_max() >= 26);
        assert_eq!(annotation.image.dimensions(), (64, 64));
        assert_eq!(
            *annotation.image.get_pixel(bbox.x_min as u32, bbox.y_min as u32),
            BOX_COLOR
        );
    }

    #[test]
    fn test_flat_frame_has_no_box() {
        let frame = Frame::new(Array2::from_elem((16, 16), 42.0));
        let annotation = annotate_frame(&frame, 5.0, 99.9, &EdgeParams::default()).unwrap();

        assert!(annotation.bbox.is_none());
        assert!(annotation.image.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
