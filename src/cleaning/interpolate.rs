//! Linear gap filling along the frame axis
//!
//! For each keypoint, masked frames are replaced by linear interpolation
//! between the nearest unmasked frames before and after them. Masked runs at
//! the start or end of a recording take the nearest unmasked value. Unmasked
//! entries are copied untouched.

use ndarray::{Array3, ArrayView2, ArrayView3};

use crate::data::{check_frame_keypoint_shape, non_finite_mask, validate_layout, SPATIAL_DIMS};
use crate::error::OutlierError;

/// Replace masked keypoint positions with interpolated estimates
///
/// # Arguments
///
/// * `coordinates` - Keypoint coordinates (frames × keypoints × 2 or 3)
/// * `mask` - Outlier mask (frames × keypoints), true = replace
///
/// # Returns
///
/// Coordinates of the same shape. Spatial axes (x, y) of masked entries are
/// interpolated. A likelihood axis, when present, is copied and set to 0 at
/// masked entries. A keypoint masked in every frame has nothing to
/// interpolate from; its spatial values become 0.
///
/// # Errors
///
/// - `ShapeMismatch` if the mask does not match the coordinates' frame and
///   keypoint counts
/// - `InvalidInput` if an unmasked entry has a non-finite x or y (masked
///   entries may hold NaN; they are replaced)
///
/// # Example
///
/// ```
/// use keypoint_outliers::cleaning::interpolate_keypoints;
/// use ndarray::array;
///
/// let coords = array![[[0.0, 0.0]], [[99.0, 99.0]], [[2.0, 4.0]]];
/// let mask = array![[false], [true], [false]];
/// let filled = interpolate_keypoints(coords.view(), mask.view())?;
/// assert_eq!(filled, array![[[0.0, 0.0]], [[1.0, 2.0]], [[2.0, 4.0]]]);
/// # Ok::<(), keypoint_outliers::OutlierError>(())
/// ```
pub fn interpolate_keypoints(
    coordinates: ArrayView3<f64>,
    mask: ArrayView2<bool>,
) -> Result<Array3<f64>, OutlierError> {
    validate_layout(coordinates)?;
    check_frame_keypoint_shape(coordinates, mask, "mask")?;

    let unmasked_gap = non_finite_mask(coordinates)
        .indexed_iter()
        .find(|&((f, k), &missing)| missing && !mask[[f, k]])
        .map(|(idx, _)| idx);
    if let Some((frame, keypoint)) = unmasked_gap {
        return Err(OutlierError::InvalidInput(format!(
            "non-finite coordinate at frame {}, keypoint {} is not masked",
            frame, keypoint
        )));
    }

    let (n_frames, n_keypoints, dim) = coordinates.dim();
    let mut filled = coordinates.to_owned();
    let mut anchors: Vec<usize> = Vec::with_capacity(n_frames);

    for k in 0..n_keypoints {
        let column = mask.column(k);
        if !column.iter().any(|&m| m) {
            continue;
        }

        anchors.clear();
        anchors.extend((0..n_frames).filter(|&f| !column[f]));

        if anchors.is_empty() {
            log::warn!(
                "Keypoint {} is masked in all {} frames; no anchor to interpolate from",
                k,
                n_frames
            );
        }

        for f in (0..n_frames).filter(|&f| column[f]) {
            for axis in 0..SPATIAL_DIMS {
                filled[[f, k, axis]] = fill_value(coordinates, &anchors, f, k, axis);
            }
            if dim > SPATIAL_DIMS {
                filled[[f, k, SPATIAL_DIMS]] = 0.0;
            }
        }
    }

    Ok(filled)
}

/// Interpolated value of `coordinates[[frame, keypoint, axis]]` from the
/// sorted unmasked frames in `anchors`
fn fill_value(
    coordinates: ArrayView3<f64>,
    anchors: &[usize],
    frame: usize,
    keypoint: usize,
    axis: usize,
) -> f64 {
    let idx = anchors.partition_point(|&a| a < frame);
    let before = idx.checked_sub(1).map(|i| anchors[i]);
    let after = anchors.get(idx).copied();

    match (before, after) {
        (Some(p), Some(n)) => {
            let y0 = coordinates[[p, keypoint, axis]];
            let y1 = coordinates[[n, keypoint, axis]];
            let t = (frame - p) as f64 / (n - p) as f64;
            y0 + (y1 - y0) * t
        }
        (Some(p), None) => coordinates[[p, keypoint, axis]],
        (None, Some(n)) => coordinates[[n, keypoint, axis]],
        (None, None) => 0.0,
    }
}
