//! Unsharp masking.

use shared::Frame;

use super::gaussian::gaussian_blur;

/// Upper clip of sharpened output, the 16-bit unsigned camera range
pub const SHARPEN_CLIP_MAX: f32 = 65535.0;

/// Sharpen by adding back the scaled high-frequency residual:
/// `frame + (frame - blur(frame, blur_sigma)) * strength`, clipped to
/// `[0, SHARPEN_CLIP_MAX]`.
pub fn sharpen(frame: &Frame, blur_sigma: f64, strength: f64) -> Frame {
    let blurred = gaussian_blur(frame.view(), blur_sigma);
    let strength = strength as f32;
    let mut data = frame.data().clone();
    data.zip_mut_with(&blurred, |v, &b| {
        *v = (*v + (*v - b) * strength).clamp(0.0, SHARPEN_CLIP_MAX);
    });
    frame.derive(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_flat_frame_unchanged() {
        let frame = Frame::new(Array2::from_elem((10, 10), 300.0));
        let out = sharpen(&frame, 2.0, 10.0);
        for &v in out.data().iter() {
            assert_relative_eq!(v, 300.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_peak_is_enhanced() {
        let mut data = Array2::from_elem((21, 21), 100.0f32);
        data[[10, 10]] = 200.0;
        let frame = Frame::new(data).with_index(9);

        let out = sharpen(&frame, 2.0, 1.0);
        assert!(out.data()[[10, 10]] > 200.0);
        assert_eq!(out.index(), Some(9));
    }

    #[test]
    fn test_output_clipped_to_sixteen_bit_range() {
        let mut data = Array2::from_elem((21, 21), 1000.0f32);
        data[[10, 10]] = 60000.0;
        data[[3, 3]] = 0.0;
        let frame = Frame::new(data);

        let out = sharpen(&frame, 3.0, 10.0);
        assert_eq!(out.data()[[10, 10]], SHARPEN_CLIP_MAX);
        assert_eq!(out.data()[[3, 3]], 0.0);
        assert!(out
            .data()
            .iter()
            .all(|&v| (0.0..=SHARPEN_CLIP_MAX).contains(&v)));
    }

    #[test]
    fn test_zero_strength_only_clips() {
        let frame = Frame::new(ndarray::arr2(&[[-5.0, 10.0], [70000.0, 3.0]]));
        let out = sharpen(&frame, 1.0, 0.0);
        assert_eq!(out.data(), &ndarray::arr2(&[[0.0, 10.0], [65535.0, 3.0]]));
    }
}
