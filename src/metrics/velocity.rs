//! Frame-to-frame keypoint velocity

use ndarray::{Array2, ArrayView3};

use crate::data::validate_coordinates;
use crate::error::OutlierError;

/// Compute per-keypoint speed between consecutive frames
///
/// Velocity at row `t` is the Euclidean norm of the (x, y) displacement from
/// frame `t` to frame `t + 1`, multiplied by `fps` to give units per second.
/// The first frame has no velocity of its own.
///
/// # Arguments
///
/// * `coordinates` - Keypoint coordinates (frames × keypoints × 2 or 3)
/// * `fps` - Recording frame rate
///
/// # Returns
///
/// Velocities, shape (frames - 1, keypoints)
///
/// # Errors
///
/// - `InsufficientData` if there are fewer than 2 frames
/// - `InvalidConfig` if `fps` is not positive and finite
pub fn keypoint_velocities(
    coordinates: ArrayView3<f64>,
    fps: f64,
) -> Result<Array2<f64>, OutlierError> {
    validate_coordinates(coordinates)?;

    if !fps.is_finite() || fps <= 0.0 {
        return Err(OutlierError::InvalidConfig(format!(
            "fps must be positive and finite, got {}",
            fps
        )));
    }

    let (n_frames, n_keypoints, _) = coordinates.dim();
    if n_frames < 2 {
        return Err(OutlierError::InsufficientData(format!(
            "velocity needs at least 2 frames, got {}",
            n_frames
        )));
    }

    log::debug!(
        "Computing keypoint velocities: {} frames, {} keypoints at {:.1} fps",
        n_frames,
        n_keypoints,
        fps
    );

    let mut velocities = Array2::zeros((n_frames - 1, n_keypoints));
    for ((t, k), velocity) in velocities.indexed_iter_mut() {
        let dx = coordinates[[t + 1, k, 0]] - coordinates[[t, k, 0]];
        let dy = coordinates[[t + 1, k, 1]] - coordinates[[t, k, 1]];
        *velocity = dx.hypot(dy) * fps;
    }

    Ok(velocities)
}
