//! Keypoint-to-keypoint distances

use ndarray::{Array3, ArrayView3};

use crate::data::validate_coordinates;
use crate::error::OutlierError;

/// Compute the distance between every ordered pair of keypoints per frame
///
/// Self-pairs are included and are always 0. The result is symmetric in its
/// last two axes.
///
/// # Arguments
///
/// * `coordinates` - Keypoint coordinates (frames × keypoints × 2 or 3)
///
/// # Returns
///
/// Distances, shape (frames, keypoints, keypoints)
///
/// # Errors
///
/// Returns `OutlierError` if the coordinates are malformed
pub fn keypoint_to_keypoint_distances(
    coordinates: ArrayView3<f64>,
) -> Result<Array3<f64>, OutlierError> {
    validate_coordinates(coordinates)?;

    let (n_frames, n_keypoints, _) = coordinates.dim();
    log::debug!(
        "Computing keypoint-to-keypoint distances: {} frames, {} keypoints",
        n_frames,
        n_keypoints
    );

    let mut distances = Array3::zeros((n_frames, n_keypoints, n_keypoints));

    for (frame, mut pairs) in coordinates.outer_iter().zip(distances.outer_iter_mut()) {
        for i in 0..n_keypoints {
            for j in (i + 1)..n_keypoints {
                let d = (frame[[i, 0]] - frame[[j, 0]]).hypot(frame[[i, 1]] - frame[[j, 1]]);
                pairs[[i, j]] = d;
                pairs[[j, i]] = d;
            }
        }
    }

    Ok(distances)
}
