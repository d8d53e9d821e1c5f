//! Interpolation and confidence rewriting
//!
//! Given raw coordinates, raw confidences and a combined outlier mask:
//! - masked positions are gap-filled along the frame axis
//! - masked confidences are forced to 0
//!
//! Output shapes always equal input shapes.

pub mod confidence;
pub mod interpolate;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

use crate::data::check_frame_keypoint_shape;
use crate::error::OutlierError;

pub use confidence::zero_masked_confidences;
pub use interpolate::interpolate_keypoints;

/// Apply an outlier mask to a recording's arrays
///
/// # Returns
///
/// `(cleaned_coordinates, rewritten_confidences)`
///
/// # Errors
///
/// `ShapeMismatch` if coordinates, confidences and mask disagree
pub fn apply_outlier_mask(
    coordinates: ArrayView3<f64>,
    confidences: ArrayView2<f64>,
    mask: ArrayView2<bool>,
) -> Result<(Array3<f64>, Array2<f64>), OutlierError> {
    check_frame_keypoint_shape(coordinates, confidences, "confidences")?;

    let cleaned = interpolate_keypoints(coordinates, mask)?;
    let rewritten = zero_masked_confidences(confidences, mask)?;

    log::debug!(
        "Interpolated {} masked entries",
        mask.iter().filter(|&&m| m).count()
    );

    Ok((cleaned, rewritten))
}
