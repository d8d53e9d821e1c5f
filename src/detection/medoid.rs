//! Medoid-distance outlier detector
//!
//! Flags a keypoint in a frame when it sits unusually far from the rest of the
//! body's median position, relative to how far that keypoint usually sits.

use ndarray::ArrayView3;

use super::threshold::{column_thresholds, exceeds_thresholds};
use super::{require_frames, DetectorKind, OutlierResult, Thresholds, MIN_METRIC_ROWS};
use crate::config::validate_scale_factor;
use crate::data::validate_coordinates;
use crate::error::OutlierError;
use crate::metrics::distance_to_medoid;

/// Identify medoid-distance outliers with a per-keypoint MAD threshold
///
/// # Arguments
///
/// * `coordinates` - Keypoint coordinates (frames × keypoints × 2 or 3); only
///   x and y are used
/// * `outlier_scale_factor` - MAD multiplier; higher values flag fewer outliers
///
/// # Returns
///
/// `OutlierResult` with a (frames × keypoints) mask and one threshold per
/// keypoint
///
/// # Errors
///
/// - `InsufficientData` with fewer than 2 frames
/// - `InvalidConfig` for a negative or non-finite scale factor
/// - `InvalidInput` for malformed coordinates
///
/// # Example
///
/// ```
/// use keypoint_outliers::detection::find_medoid_distance_outliers;
/// use ndarray::Array3;
///
/// let mut coords = Array3::<f64>::zeros((10, 3, 2));
/// for f in 0..10 {
///     coords[[f, 1, 0]] = 1.0;
///     coords[[f, 2, 1]] = 1.0;
/// }
/// coords[[9, 0, 0]] = 1000.0;
/// coords[[9, 0, 1]] = 1000.0;
///
/// let result = find_medoid_distance_outliers(coords.view(), 4.0)?;
/// assert!(result.mask[[9, 0]]);
/// assert_eq!(result.outlier_count(), 1);
/// # Ok::<(), keypoint_outliers::OutlierError>(())
/// ```
pub fn find_medoid_distance_outliers(
    coordinates: ArrayView3<f64>,
    outlier_scale_factor: f64,
) -> Result<OutlierResult, OutlierError> {
    validate_scale_factor(outlier_scale_factor)?;
    validate_coordinates(coordinates)?;
    require_frames(coordinates.dim().0, MIN_METRIC_ROWS, DetectorKind::MedoidDistance)?;

    let distances = distance_to_medoid(coordinates)?;
    let thresholds = column_thresholds(distances.view(), outlier_scale_factor)?;
    let mask = exceeds_thresholds(distances.view(), thresholds.view());

    let result = OutlierResult {
        kind: DetectorKind::MedoidDistance,
        mask,
        thresholds: Thresholds::PerKeypoint(thresholds),
        pair_mask: None,
    };

    log::debug!(
        "Medoid-distance detector flagged {} entries (scale factor {:.1})",
        result.outlier_count(),
        outlier_scale_factor
    );

    Ok(result)
}
