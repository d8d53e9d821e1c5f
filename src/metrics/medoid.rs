//! Distance from each keypoint to the per-frame medoid
//!
//! The medoid here is the coordinate-wise median of all keypoints in a frame,
//! not one of the tracked points. A single wildly displaced keypoint barely
//! moves it, so that keypoint stands out as far from the rest of the body.
//!
//! # Example
//!
//! ```
//! use keypoint_outliers::metrics::distance_to_medoid;
//! use ndarray::array;
//!
//! // one frame, three keypoints on a line
//! let coords = array![[[0.0, 0.0], [1.0, 0.0], [10.0, 0.0]]];
//! let distances = distance_to_medoid(coords.view())?;
//! assert_eq!(distances.row(0).to_vec(), vec![1.0, 0.0, 9.0]);
//! # Ok::<(), keypoint_outliers::OutlierError>(())
//! ```

use ndarray::{Array2, ArrayView2, ArrayView3};

use super::median_in_place;
use crate::data::validate_coordinates;
use crate::error::OutlierError;

/// Compute Euclidean distance from every keypoint to its frame's medoid
///
/// # Arguments
///
/// * `coordinates` - Keypoint coordinates (frames × keypoints × 2 or 3)
///
/// # Returns
///
/// Non-negative distances, shape (frames, keypoints)
///
/// # Errors
///
/// Returns `OutlierError` if the coordinates are malformed
pub fn distance_to_medoid(coordinates: ArrayView3<f64>) -> Result<Array2<f64>, OutlierError> {
    validate_coordinates(coordinates)?;

    let (n_frames, n_keypoints, _) = coordinates.dim();
    log::debug!(
        "Computing distance to medoid: {} frames, {} keypoints",
        n_frames,
        n_keypoints
    );

    let mut distances = Array2::zeros((n_frames, n_keypoints));
    let mut scratch = Vec::with_capacity(n_keypoints);

    for (frame, mut row) in coordinates.outer_iter().zip(distances.outer_iter_mut()) {
        let [mx, my] = frame_medoid(frame, &mut scratch);
        for (point, distance) in frame.outer_iter().zip(row.iter_mut()) {
            *distance = (point[0] - mx).hypot(point[1] - my);
        }
    }

    Ok(distances)
}

/// Coordinate-wise median (x, y) of one frame's keypoints
pub(crate) fn frame_medoid(frame: ArrayView2<f64>, scratch: &mut Vec<f64>) -> [f64; 2] {
    let mut medoid = [0.0; 2];
    for (axis, value) in medoid.iter_mut().enumerate() {
        scratch.clear();
        scratch.extend(frame.column(axis).iter().copied());
        *value = median_in_place(scratch);
    }
    medoid
}
