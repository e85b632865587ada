//! Edge-based region detection for annotating 8-bit display images.
//!
//! The detector is a Canny-style front end: Sobel gradients, non-maximum
//! suppression along the quantized gradient direction, hysteresis
//! thresholding, a small dilation to close gaps, and connected-component
//! labelling. The union of all component boxes is what
//! gets drawn on the annotated preview.

use log::debug;
use ndarray::{Array2, ArrayView2};

/// Bounding box for a detected region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    /// Top left x coordinate
    pub x_min: usize,

    /// Top left y coordinate
    pub y_min: usize,

    /// Width of the bounding box
    pub width: usize,

    /// Height of the bounding box
    pub height: usize,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(x_min: usize, y_min: usize, width: usize, height: usize) -> Self {
        Self {
            x_min,
            y_min,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn x_max(&self) -> usize {
        self.x_min + self.width
    }

    /// Exclusive bottom edge
    pub fn y_max(&self) -> usize {
        self.y_min + self.height
    }

    /// Smallest box containing both boxes
    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        let x_min = self.x_min.min(other.x_min);
        let y_min = self.y_min.min(other.y_min);
        let x_max = self.x_max().max(other.x_max());
        let y_max = self.y_max().max(other.y_max());

        BoundingBox {
            x_min,
            y_min,
            width: x_max - x_min,
            height: y_max - y_min,
        }
    }

    /// Grow by `padding` on every side, clipped to a `width x height` image.
    pub fn padded(&self, padding: usize, width: usize, height: usize) -> BoundingBox {
        let x_min = self.x_min.saturating_sub(padding);
        let y_min = self.y_min.saturating_sub(padding);
        let x_max = (self.x_max() + padding).min(width);
        let y_max = (self.y_max() + padding).min(height);

        BoundingBox {
            x_min,
            y_min,
            width: x_max.saturating_sub(x_min),
            height: y_max.saturating_sub(y_min),
        }
    }
}

/// Tuning for [`find_bounding_box`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParams {
    /// Gradient magnitude below which a pixel is never an edge
    pub low_threshold: f32,
    /// Gradient magnitude above which a pixel is always an edge
    pub high_threshold: f32,
    /// Square dilation radius applied to the edge mask (1 gives 3x3)
    pub dilation_radius: usize,
    /// Margin added around the union box
    pub padding: usize,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 150.0,
            dilation_radius: 1,
            padding: 10,
        }
    }
}

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge sample (`-1 -> 1`, `len -> len - 2`).
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    while i < 0 || i > last {
        i = if i < 0 { -i } else { 2 * last - i };
    }
    i as usize
}

/// Horizontal and vertical 3x3 Sobel derivatives, `(gx, gy)`.
///
/// `gx` grows to the right and `gy` downwards; borders mirror without
/// repeating the edge sample.
pub fn sobel_gradients(image: ArrayView2<u8>) -> (Array2<f32>, Array2<f32>) {
    let (rows, cols) = image.dim();
    let at = |y: isize, x: isize| -> f32 {
        image[[reflect_101(y, rows), reflect_101(x, cols)]] as f32
    };

    let mut gx = Array2::zeros((rows, cols));
    let mut gy = Array2::zeros((rows, cols));
    for y in 0..rows {
        for x in 0..cols {
            let (yi, xi) = (y as isize, x as isize);
            gx[[y, x]] = (at(yi - 1, xi + 1) + 2.0 * at(yi, xi + 1) + at(yi + 1, xi + 1))
                - (at(yi - 1, xi - 1) + 2.0 * at(yi, xi - 1) + at(yi + 1, xi - 1));
            gy[[y, x]] = (at(yi + 1, xi - 1) + 2.0 * at(yi + 1, xi) + at(yi + 1, xi + 1))
                - (at(yi - 1, xi - 1) + 2.0 * at(yi - 1, xi) + at(yi - 1, xi + 1));
        }
    }
    (gx, gy)
}

/// Sobel gradient magnitude as `|gx| + |gy|` with 3x3 kernels.
pub fn sobel_magnitude(image: ArrayView2<u8>) -> Array2<f32> {
    let (gx, gy) = sobel_gradients(image);
    l1_magnitude(gx.view(), gy.view())
}

fn l1_magnitude(gx: ArrayView2<f32>, gy: ArrayView2<f32>) -> Array2<f32> {
    let mut magnitude = gx.mapv(f32::abs);
    magnitude.zip_mut_with(&gy, |m, &g| *m += g.abs());
    magnitude
}

/// tan(22.5 deg) and tan(67.5 deg), the gradient direction bin limits
const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

/// Thin the L1 gradient magnitude to one-pixel ridges.
///
/// The gradient direction is quantized to horizontal, vertical or one of
/// the two diagonals. A pixel keeps its magnitude only when it is strictly
/// greater than the neighbour behind it and at least the neighbour ahead
/// of it along that direction; everything else becomes zero. Neighbours
/// outside the image count as zero.
pub fn non_max_suppression(gx: ArrayView2<f32>, gy: ArrayView2<f32>) -> Array2<f32> {
    let (rows, cols) = gx.dim();
    let magnitude = l1_magnitude(gx, gy);
    let at = |y: isize, x: isize| -> f32 {
        if y < 0 || x < 0 || y >= rows as isize || x >= cols as isize {
            0.0
        } else {
            magnitude[[y as usize, x as usize]]
        }
    };

    Array2::from_shape_fn((rows, cols), |(y, x)| {
        let m = magnitude[[y, x]];
        if m == 0.0 {
            return 0.0;
        }
        let (dx, dy) = (gx[[y, x]], gy[[y, x]]);
        let (ax, ay) = (dx.abs(), dy.abs());
        let (yi, xi) = (y as isize, x as isize);

        let (behind, ahead) = if ay <= ax * TAN_22_5 {
            (at(yi, xi - 1), at(yi, xi + 1))
        } else if ay > ax * TAN_67_5 {
            (at(yi - 1, xi), at(yi + 1, xi))
        } else {
            let s: isize = if (dx < 0.0) != (dy < 0.0) { -1 } else { 1 };
            (at(yi - 1, xi - s), at(yi + 1, xi + s))
        };

        if m > behind && m >= ahead {
            m
        } else {
            0.0
        }
    })
}

/// Hysteresis thresholding of a gradient magnitude image.
///
/// Pixels above `high` are edges. Pixels above `low` are edges only when
/// 8-connected, through other such pixels, to a pixel above `high`.
pub fn hysteresis_edges(magnitude: ArrayView2<f32>, low: f32, high: f32) -> Array2<bool> {
    let candidates = magnitude.mapv(|m| m > low);
    let (labels, num_labels) = connected_components(candidates.view());

    let mut anchored = vec![false; num_labels as usize + 1];
    for (&label, &m) in labels.iter().zip(magnitude.iter()) {
        if label > 0 && m > high {
            anchored[label as usize] = true;
        }
    }

    labels.mapv(|label| label > 0 && anchored[label as usize])
}

/// Binary dilation with a `(2r+1) x (2r+1)` square structuring element.
pub fn dilate(mask: ArrayView2<bool>, radius: usize) -> Array2<bool> {
    if radius == 0 {
        return mask.to_owned();
    }
    let (rows, cols) = mask.dim();
    let mut out = Array2::from_elem((rows, cols), false);

    for ((y, x), &set) in mask.indexed_iter() {
        if !set {
            continue;
        }
        let y_range = y.saturating_sub(radius)..(y + radius + 1).min(rows);
        for ny in y_range {
            for nx in x.saturating_sub(radius)..(x + radius + 1).min(cols) {
                out[[ny, nx]] = true;
            }
        }
    }

    out
}

/// Find connected components in a binary mask
///
/// This uses a simple 8-connectivity flood fill algorithm.
///
/// # Returns
///
/// A labeled image where each connected component has a unique label
/// starting at 1, and the number of labels
pub fn connected_components(mask: ArrayView2<bool>) -> (Array2<u32>, u32) {
    let (rows, cols) = mask.dim();
    let mut labels = Array2::zeros((rows, cols));
    let mut label_counter = 0;

    let neighbors = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];

    for i in 0..rows {
        for j in 0..cols {
            if !mask[[i, j]] || labels[[i, j]] != 0 {
                continue;
            }
            label_counter += 1;
            let mut stack = vec![(i, j)];

            while let Some((y, x)) = stack.pop() {
                if labels[[y, x]] != 0 {
                    continue;
                }
                labels[[y, x]] = label_counter;

                for &(dy, dx) in &neighbors {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;
                    if ny < 0 || ny >= rows as isize || nx < 0 || nx >= cols as isize {
                        continue;
                    }
                    let (ny, nx) = (ny as usize, nx as usize);
                    if mask[[ny, nx]] && labels[[ny, nx]] == 0 {
                        stack.push((ny, nx));
                    }
                }
            }
        }
    }

    (labels, label_counter)
}

/// Convert connected components to bounding boxes, ordered by label.
pub fn components_to_bboxes(labels: ArrayView2<u32>, num_labels: u32) -> Vec<BoundingBox> {
    let mut boxes: Vec<Option<BoundingBox>> = vec![None; num_labels as usize];

    for ((y, x), &label) in labels.indexed_iter() {
        if label == 0 {
            continue;
        }
        let pixel = BoundingBox::new(x, y, 1, 1);
        let slot = &mut boxes[label as usize - 1];
        let merged = match *slot {
            Some(existing) => existing.merge(&pixel),
            None => pixel,
        };
        *slot = Some(merged);
    }

    boxes.into_iter().flatten().collect()
}

/// Union box of every edge region in an 8-bit image, padded and clipped.
///
/// Returns `None` when no edges survive thresholding.
pub fn find_bounding_box(image: ArrayView2<u8>, params: &EdgeParams) -> Option<BoundingBox> {
    let (rows, cols) = image.dim();
    let (gx, gy) = sobel_gradients(image);
    let thinned = non_max_suppression(gx.view(), gy.view());
    let edges = hysteresis_edges(
        thinned.view(),
        params.low_threshold,
        params.high_threshold,
    );
    let dilated = dilate(edges.view(), params.dilation_radius);
    let (labels, num_labels) = connected_components(dilated.view());
    let boxes = components_to_bboxes(labels.view(), num_labels);
    debug!("Edge detection found {} regions", boxes.len());

    boxes
        .into_iter()
        .reduce(|acc, b| acc.merge(&b))
        .map(|b| b.padded(params.padding, cols, rows))
}
