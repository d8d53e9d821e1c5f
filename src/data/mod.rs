//! Recording containers and input validation
//!
//! - Recording (coordinates + confidences + optional body-part labels)
//! - Insertion-ordered recording maps
//! - Shape and value checks shared by every pipeline stage

pub mod recording;

use ndarray::{Array2, ArrayView2, ArrayView3, Axis};

use crate::error::OutlierError;

pub use recording::{collect_recordings_from_maps, recordings_from_maps, Recording, RecordingSet};

/// Number of leading axes per keypoint treated as spatial (x, y)
pub const SPATIAL_DIMS: usize = 2;

/// Check the layout of a coordinate tensor (frames × keypoints × dims)
///
/// Dims must be 2 (x, y) or 3 (x, y, likelihood) and there must be at least
/// one frame and one keypoint. Values are not inspected.
///
/// # Errors
///
/// `InvalidInput` for a malformed layout, `InsufficientData` for an empty
/// frame axis
pub fn validate_layout(coordinates: ArrayView3<f64>) -> Result<(), OutlierError> {
    let (n_frames, n_keypoints, dim) = coordinates.dim();

    if dim != 2 && dim != 3 {
        return Err(OutlierError::InvalidInput(format!(
            "keypoints must have 2 or 3 axes, got {}",
            dim
        )));
    }

    if n_keypoints == 0 {
        return Err(OutlierError::InvalidInput(
            "coordinates contain no keypoints".to_string(),
        ));
    }

    if n_frames == 0 {
        return Err(OutlierError::InsufficientData(
            "coordinates contain no frames".to_string(),
        ));
    }

    Ok(())
}

/// Check a coordinate tensor before computing metrics on it
///
/// Same layout rules as [`validate_layout`]; in addition every spatial value
/// must be finite. The likelihood axis is not inspected.
///
/// # Errors
///
/// `InvalidInput` for a malformed layout or non-finite values,
/// `InsufficientData` for an empty frame axis
pub fn validate_coordinates(coordinates: ArrayView3<f64>) -> Result<(), OutlierError> {
    validate_layout(coordinates)?;

    let spatial = coordinates.slice_axis(Axis(2), (0..SPATIAL_DIMS).into());
    if let Some(((frame, keypoint, _), _)) =
        spatial.indexed_iter().find(|(_, v)| !v.is_finite())
    {
        return Err(OutlierError::InvalidInput(format!(
            "non-finite coordinate at frame {}, keypoint {}",
            frame, keypoint
        )));
    }

    Ok(())
}

/// Entries whose x or y is NaN or infinite (frames × keypoints)
///
/// Pose estimators emit NaN for keypoints they did not detect.
pub fn non_finite_mask(coordinates: ArrayView3<f64>) -> Array2<bool> {
    let (n_frames, n_keypoints, _) = coordinates.dim();
    Array2::from_shape_fn((n_frames, n_keypoints), |(f, k)| {
        (0..SPATIAL_DIMS).any(|axis| !coordinates[[f, k, axis]].is_finite())
    })
}

/// Check that a per-frame, per-keypoint array matches the coordinate tensor
///
/// `what` names the array in the error message ("confidences", "mask", ...).
pub(crate) fn check_frame_keypoint_shape<T>(
    coordinates: ArrayView3<f64>,
    other: ArrayView2<T>,
    what: &str,
) -> Result<(), OutlierError> {
    let (n_frames, n_keypoints, _) = coordinates.dim();
    let (other_frames, other_keypoints) = other.dim();

    if other_frames != n_frames || other_keypoints != n_keypoints {
        return Err(OutlierError::ShapeMismatch(format!(
            "coordinates are {} frames x {} keypoints but {} are {} x {}",
            n_frames, n_keypoints, what, other_frames, other_keypoints
        )));
    }

    Ok(())
}
