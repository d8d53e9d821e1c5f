//! Keypoint-distance consensus detector
//!
//! Second-order test: a keypoint is flagged in a frame when its distance to a
//! large enough share of the other keypoints is abnormal. Each ordered pair
//! (k, j) gets its own MAD threshold over all frames; keypoint k is an outlier
//! in frame f when at least `threshold_percentage * (K - 1)` of its pairs
//! exceed their thresholds.
//!
//! Cost is O(frames × K²); pair flags and per-keypoint tallies are produced in
//! a single pass over the distance tensor.

use ndarray::{Array2, Array3, ArrayView3};

use super::threshold::column_thresholds;
use super::{require_frames, DetectorKind, OutlierResult, Thresholds, MIN_METRIC_ROWS};
use crate::config::{validate_scale_factor, validate_threshold_percentage};
use crate::data::validate_coordinates;
use crate::error::OutlierError;
use crate::metrics::keypoint_to_keypoint_distances;

/// Identify keypoints whose distances to most other keypoints are abnormal
///
/// # Arguments
///
/// * `coordinates` - Keypoint coordinates (frames × keypoints × 2 or 3)
/// * `outlier_scale_factor` - MAD multiplier for the per-pair thresholds
/// * `threshold_percentage` - Fraction in [0, 1] of the other K - 1 keypoints
///   that must be pair outliers before keypoint k is flagged. 0 flags every
///   keypoint in every frame.
///
/// # Returns
///
/// `OutlierResult` with a (frames × K) mask, (K × K) thresholds and the
/// (frames × K × K) pair mask
///
/// # Errors
///
/// - `InsufficientData` with fewer than 2 frames or fewer than 2 keypoints
/// - `InvalidConfig` for a bad scale factor or percentage
pub fn find_keypoint_distance_outliers(
    coordinates: ArrayView3<f64>,
    outlier_scale_factor: f64,
    threshold_percentage: f64,
) -> Result<OutlierResult, OutlierError> {
    validate_scale_factor(outlier_scale_factor)?;
    validate_threshold_percentage(threshold_percentage)?;
    validate_coordinates(coordinates)?;

    let (n_frames, n_keypoints, _) = coordinates.dim();
    require_frames(n_frames, MIN_METRIC_ROWS, DetectorKind::KeypointDistance)?;
    if n_keypoints < 2 {
        return Err(OutlierError::InsufficientData(format!(
            "keypoint_distance detector needs at least 2 keypoints, got {}",
            n_keypoints
        )));
    }

    let distances = keypoint_to_keypoint_distances(coordinates)?;

    // Step 1: one MAD threshold per ordered pair, over frames
    let flat = distances
        .to_shape((n_frames, n_keypoints * n_keypoints))
        .map_err(|e| OutlierError::InvalidInput(format!("pair distance layout: {}", e)))?;
    let thresholds = column_thresholds(flat.view(), outlier_scale_factor)?
        .into_shape_with_order((n_keypoints, n_keypoints))
        .map_err(|e| OutlierError::InvalidInput(format!("pair threshold layout: {}", e)))?;

    // Step 2: pair flags and per-keypoint tallies in one pass
    let required = threshold_percentage * (n_keypoints - 1) as f64;
    let mut pair_mask = Array3::from_elem((n_frames, n_keypoints, n_keypoints), false);
    let mut mask = Array2::from_elem((n_frames, n_keypoints), false);

    for f in 0..n_frames {
        for k in 0..n_keypoints {
            let mut outlier_pairs = 0usize;
            for j in 0..n_keypoints {
                // self-pairs are 0 with a 0 threshold, never counted
                if distances[[f, k, j]] > thresholds[[k, j]] {
                    pair_mask[[f, k, j]] = true;
                    outlier_pairs += 1;
                }
            }
            mask[[f, k]] = outlier_pairs as f64 >= required;
        }
    }

    let result = OutlierResult {
        kind: DetectorKind::KeypointDistance,
        mask,
        thresholds: Thresholds::PerPair(thresholds),
        pair_mask: Some(pair_mask),
    };

    log::debug!(
        "Keypoint-distance detector flagged {} entries (scale factor {:.1}, consensus {:.0}%)",
        result.outlier_count(),
        outlier_scale_factor,
        threshold_percentage * 100.0
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Five keypoints on a stable pentagon-ish layout with small jitter
    fn skeleton(n_frames: usize) -> Array3<f64> {
        let base = [(0.0, 0.0), (10.0, 0.0), (12.0, 8.0), (5.0, 14.0), (-2.0, 8.0)];
        Array3::from_shape_fn((n_frames, base.len(), 2), |(f, k, d)| {
            let jitter = ((f * 7 + k * 3 + d) % 5) as f64 * 0.1;
            if d == 0 {
                base[k].0 + jitter
            } else {
                base[k].1 + jitter
            }
        })
    }

    #[test]
    fn test_flags_keypoint_far_from_skeleton() {
        let mut coords = skeleton(30);
        coords[[12, 3, 0]] = 400.0;
        coords[[12, 3, 1]] = -300.0;

        let result = find_keypoint_distance_outliers(coords.view(), 6.0, 0.5).unwrap();
        assert_eq!(result.kind, DetectorKind::KeypointDistance);
        assert_eq!(result.mask.dim(), (30, 5));
        assert!(result.mask[[12, 3]]);

        // the other keypoints only disagree with keypoint 3: 1 of 4 < 50%
        for k in [0, 1, 2, 4] {
            assert!(!result.mask[[12, k]], "keypoint {} wrongly flagged", k);
        }

        let pair_mask = result.pair_mask.as_ref().unwrap();
        assert_eq!(pair_mask.dim(), (30, 5, 5));
        assert!(pair_mask[[12, 3, 0]]);
        assert!(pair_mask[[12, 0, 3]]);
        assert!(!pair_mask[[12, 3, 3]]);
    }

    #[test]
    fn test_thresholds_are_per_pair_and_symmetric() {
        let coords = skeleton(25);
        let result = find_keypoint_distance_outliers(coords.view(), 4.0, 0.3).unwrap();
        let thresholds = result.thresholds.per_pair().unwrap();

        assert_eq!(thresholds.dim(), (5, 5));
        for k in 0..5 {
            assert_eq!(thresholds[[k, k]], 0.0);
            for j in 0..5 {
                assert_eq!(thresholds[[k, j]], thresholds[[j, k]]);
            }
        }
    }

    #[test]
    fn test_requires_two_keypoints() {
        let coords = Array3::<f64>::zeros((10, 1, 2));
        let err = find_keypoint_distance_outliers(coords.view(), 4.0, 0.3).unwrap_err();
        assert!(matches!(err, OutlierError::InsufficientData(_)));
    }

    #[test]
    fn test_rejects_percentage_out_of_range() {
        let coords = skeleton(10);
        let err = find_keypoint_distance_outliers(coords.view(), 4.0, 1.2).unwrap_err();
        assert!(matches!(err, OutlierError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_percentage_flags_everything() {
        let coords = skeleton(10);
        let result = find_keypoint_distance_outliers(coords.view(), 4.0, 0.0).unwrap();
        assert_eq!(result.outlier_count(), 10 * 5);
    }
}
