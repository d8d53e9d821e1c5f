//! Velocity outlier detector
//!
//! Flags unusually large frame-to-frame jumps of a keypoint.

use ndarray::ArrayView3;

use super::threshold::{column_thresholds, exceeds_thresholds};
use super::{require_frames, DetectorKind, OutlierResult, Thresholds, MIN_METRIC_ROWS};
use crate::config::validate_scale_factor;
use crate::data::validate_coordinates;
use crate::error::OutlierError;
use crate::metrics::keypoint_velocities;

/// Identify velocity outliers with a per-keypoint MAD threshold
///
/// The mask has one row per frame transition ((frames - 1) × keypoints). Use
/// [`OutlierResult::frame_aligned_mask`] to place it on the frame axis before
/// combining it with frame masks.
///
/// # Arguments
///
/// * `coordinates` - Keypoint coordinates (frames × keypoints × 2 or 3)
/// * `outlier_scale_factor` - MAD multiplier
/// * `fps` - Frame rate; velocities are expressed per second
///
/// # Errors
///
/// - `InsufficientData` with fewer than 3 frames (2 velocity rows)
/// - `InvalidConfig` for a bad scale factor or fps
pub fn find_velocity_outliers(
    coordinates: ArrayView3<f64>,
    outlier_scale_factor: f64,
    fps: f64,
) -> Result<OutlierResult, OutlierError> {
    validate_scale_factor(outlier_scale_factor)?;
    validate_coordinates(coordinates)?;
    require_frames(coordinates.dim().0, MIN_METRIC_ROWS + 1, DetectorKind::Velocity)?;

    let velocities = keypoint_velocities(coordinates, fps)?;
    let thresholds = column_thresholds(velocities.view(), outlier_scale_factor)?;
    let mask = exceeds_thresholds(velocities.view(), thresholds.view());

    let result = OutlierResult {
        kind: DetectorKind::Velocity,
        mask,
        thresholds: Thresholds::PerKeypoint(thresholds),
        pair_mask: None,
    };

    log::debug!(
        "Velocity detector flagged {} transitions (scale factor {:.1}, {:.1} fps)",
        result.outlier_count(),
        outlier_scale_factor,
        fps
    );

    Ok(result)
}
