//! Missing detections
//!
//! Pose estimators report undetected keypoints as NaN. Those entries are
//! marked like outliers so they are interpolated and get zero confidence.

use ndarray::ArrayView3;

use super::{DetectorKind, OutlierResult, Thresholds};
use crate::data::{non_finite_mask, validate_layout};
use crate::error::OutlierError;

/// Mark entries whose x or y is NaN or infinite
///
/// # Errors
///
/// `InvalidInput` / `InsufficientData` for a malformed coordinate layout
pub fn find_missing_points(coordinates: ArrayView3<f64>) -> Result<OutlierResult, OutlierError> {
    validate_layout(coordinates)?;

    let result = OutlierResult {
        kind: DetectorKind::NonFinite,
        mask: non_finite_mask(coordinates),
        thresholds: Thresholds::NotApplicable,
        pair_mask: None,
    };

    if result.outlier_count() > 0 {
        log::warn!("{} missing keypoint positions (NaN or infinite)", result.outlier_count());
    }

    Ok(result)
}
