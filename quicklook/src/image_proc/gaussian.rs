//! Separable Gaussian smoothing.
//!
//! Kernel radius is `round(4 * sigma)` and image borders are handled by
//! half-sample reflection (`d c b a | a b c d | d c b a`).

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Zip};

/// Kernel half-width in units of sigma
const TRUNCATE: f64 = 4.0;

/// Normalized 1D Gaussian kernel of length `2 * radius + 1`.
///
/// The radius is `round(4 * sigma)`, capped at `max_radius`. Filtering a
/// line of length `n` only needs a radius up to `n`; beyond that the
/// reflected samples repeat and the tails carry negligible weight.
///
/// # Panics
/// If `sigma` is not positive.
pub fn gaussian_kernel_1d(sigma: f64, max_radius: usize) -> Vec<f64> {
    assert!(sigma > 0.0, "Sigma must be positive");

    let radius = (TRUNCATE * sigma + 0.5).min(max_radius as f64) as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Index into `0..len` reflecting about the half-sample edges.
#[inline]
fn reflect_index(i: isize, len: usize) -> usize {
    let n = len as isize;
    let m = i.rem_euclid(2 * n);
    if m >= n {
        (2 * n - 1 - m) as usize
    } else {
        m as usize
    }
}

fn convolve_line(input: ArrayView1<f32>, mut output: ArrayViewMut1<f32>, kernel: &[f64]) {
    let len = input.len();
    let radius = (kernel.len() / 2) as isize;
    for (x, out) in output.iter_mut().enumerate() {
        let acc: f64 = kernel
            .iter()
            .enumerate()
            .map(|(k, &w)| {
                let idx = reflect_index(x as isize + k as isize - radius, len);
                w * input[idx] as f64
            })
            .sum();
        *out = acc as f32;
    }
}

/// Blur a 2D image with an isotropic Gaussian of standard deviation
/// `sigma` pixels.
///
/// Rows are filtered first, then columns; both passes run in parallel
/// across lines. A non-positive sigma returns an unchanged copy.
pub fn gaussian_blur(image: ArrayView2<f32>, sigma: f64) -> Array2<f32> {
    if sigma <= 0.0 || image.is_empty() {
        return image.to_owned();
    }
    let (height, width) = image.dim();
    let row_kernel = gaussian_kernel_1d(sigma, width);
    let column_kernel = gaussian_kernel_1d(sigma, height);

    let mut rows_done = Array2::<f32>::zeros(image.raw_dim());
    Zip::from(rows_done.rows_mut())
        .and(image.rows())
        .par_for_each(|out, inp| convolve_line(inp, out, &row_kernel));

    let mut output = Array2::<f32>::zeros(image.raw_dim());
    Zip::from(output.columns_mut())
        .and(rows_done.columns())
        .par_for_each(|out, inp| convolve_line(inp, out, &column_kernel));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_normalized_and_symmetric() {
        let kernel = gaussian_kernel_1d(2.0, 100);
        assert_eq!(kernel.len(), 17);
        assert_relative_eq!(kernel.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        for i in 0..kernel.len() / 2 {
            assert_relative_eq!(kernel[i], kernel[kernel.len() - 1 - i]);
        }
        assert!(kernel[8] > kernel[7]);
    }

    #[test]
    fn test_kernel_radius_capped() {
        assert_eq!(gaussian_kernel_1d(2.0, 3).len(), 7);
        let wide = gaussian_kernel_1d(1e20, 4);
        assert_eq!(wide.len(), 9);
        assert_relative_eq!(wide.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_huge_sigma_stays_bounded() {
        let image = Array2::from_elem((5, 7), 9.0f32);
        let blurred = gaussian_blur(image.view(), 1e20);
        assert_eq!(blurred.dim(), (5, 7));
        for &v in blurred.iter() {
            assert_relative_eq!(v, 9.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(2, 4), 2);
        // Kernel much wider than the line keeps folding
        assert_eq!(reflect_index(9, 4), 1);
        assert_eq!(reflect_index(-9, 1), 0);
    }

    #[test]
    fn test_constant_image_unchanged() {
        let image = Array2::from_elem((12, 9), 42.0f32);
        let blurred = gaussian_blur(image.view(), 3.0);
        for &v in blurred.iter() {
            assert_relative_eq!(v, 42.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_preserves_total_flux() {
        // Impulses further than the kernel radius from every edge
        let mut image = Array2::zeros((21, 21));
        image[[10, 10]] = 100.0f32;
        image[[8, 12]] = 50.0;
        let blurred = gaussian_blur(image.view(), 1.5);
        assert_relative_eq!(blurred.sum(), 150.0, epsilon = 1e-3);
        assert!(blurred[[10, 10]] < 100.0);
        assert!(blurred[[10, 11]] > 0.0);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let image = Array2::from_shape_fn((3, 4), |(y, x)| (y * 4 + x) as f32);
        assert_eq!(gaussian_blur(image.view(), 0.0), image);
    }

    #[test]
    fn test_blur_is_symmetric_for_centered_impulse() {
        let mut image = Array2::zeros((11, 11));
        image[[5, 5]] = 1.0f32;
        let blurred = gaussian_blur(image.view(), 1.0);
        assert_relative_eq!(blurred[[5, 4]], blurred[[5, 6]], epsilon = 1e-7);
        assert_relative_eq!(blurred[[4, 5]], blurred[[6, 5]], epsilon = 1e-7);
        assert_relative_eq!(blurred[[4, 5]], blurred[[5, 4]], epsilon = 1e-7);
    }
}
