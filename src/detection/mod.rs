//! Robust outlier detectors
//!
//! Every detector follows the same pattern: derive a distance metric, compute
//! a per-column median + MAD threshold over all frames of the recording, and
//! flag entries that strictly exceed it.
//! - Medoid distance (keypoint far from the body's median position)
//! - Velocity (unusually large frame-to-frame jump)
//! - Keypoint distance (keypoint inconsistent with most of the skeleton)
//! - Mask combination (logical OR with provenance)

pub mod combine;
pub mod medoid;
pub mod missing;
pub mod pairwise;
pub mod threshold;
pub mod velocity;

use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::error::OutlierError;

pub use combine::{combine_outliers, CombinedOutliers};
pub use medoid::find_medoid_distance_outliers;
pub use missing::find_missing_points;
pub use pairwise::find_keypoint_distance_outliers;
pub use velocity::find_velocity_outliers;

/// Minimum number of metric rows needed to compute a MAD threshold
pub const MIN_METRIC_ROWS: usize = 2;

/// Detector that produced an outlier mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Distance to the per-frame medoid
    MedoidDistance,
    /// Frame-to-frame velocity
    Velocity,
    /// Keypoint-to-keypoint distance consensus
    KeypointDistance,
    /// Missing detection (NaN or infinite x/y in the input)
    NonFinite,
}

impl DetectorKind {
    /// Short identifier (e.g. "medoid_distance")
    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::MedoidDistance => "medoid_distance",
            DetectorKind::Velocity => "velocity",
            DetectorKind::KeypointDistance => "keypoint_distance",
            DetectorKind::NonFinite => "non_finite",
        }
    }
}

/// Outlier thresholds computed by one detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "values", rename_all = "snake_case")]
pub enum Thresholds {
    /// One threshold per keypoint
    PerKeypoint(Array1<f64>),
    /// One threshold per ordered keypoint pair (K × K)
    PerPair(Array2<f64>),
    /// No statistic involved (missing detections)
    NotApplicable,
}

impl Thresholds {
    /// Per-keypoint thresholds, if this detector produced them
    pub fn per_keypoint(&self) -> Option<&Array1<f64>> {
        match self {
            Thresholds::PerKeypoint(t) => Some(t),
            _ => None,
        }
    }

    /// Per-pair thresholds, if this detector produced them
    pub fn per_pair(&self) -> Option<&Array2<f64>> {
        match self {
            Thresholds::PerPair(t) => Some(t),
            _ => None,
        }
    }
}

/// Output of a single detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierResult {
    /// Detector that produced this result
    pub kind: DetectorKind,

    /// Outlier mask, one row per metric row (frames, or frames - 1 for
    /// velocity) and one column per keypoint
    pub mask: Array2<bool>,

    /// Thresholds used to build the mask
    pub thresholds: Thresholds,

    /// Per-pair outlier flags (frames × K × K), keypoint-distance detector only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_mask: Option<Array3<bool>>,
}

impl OutlierResult {
    /// Number of flagged entries
    pub fn outlier_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Mask expressed on the frame axis of a recording with `n_frames` frames
    ///
    /// Frame masks are returned as-is. A velocity mask has one row per
    /// transition (row `t` is the jump from frame `t` to `t + 1`). A one-frame
    /// glitch at frame `f` trips both the jump in and the jump out, so an
    /// interior frame is flagged only when the transitions on both sides of it
    /// are. The first and last frame have a single transition; they are
    /// flagged when it is, unless the neighbouring frame's other transition is
    /// flagged too (then the glitch is the neighbour, not the end frame).
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the mask does not belong to a recording of
    /// `n_frames` frames
    pub fn frame_aligned_mask(&self, n_frames: usize) -> Result<Array2<bool>, OutlierError> {
        let (rows, n_keypoints) = self.mask.dim();

        match self.kind {
            DetectorKind::Velocity if rows >= 1 && rows + 1 == n_frames => {
                let jump = |t: usize, k: usize| self.mask.get((t, k)).copied().unwrap_or(false);
                let last = n_frames - 1;

                Ok(Array2::from_shape_fn((n_frames, n_keypoints), |(f, k)| {
                    if f == 0 {
                        jump(0, k) && !jump(1, k)
                    } else if f == last {
                        jump(last - 1, k) && (last < 2 || !jump(last - 2, k))
                    } else {
                        jump(f - 1, k) && jump(f, k)
                    }
                }))
            }
            DetectorKind::MedoidDistance | DetectorKind::KeypointDistance | DetectorKind::NonFinite
                if rows == n_frames =>
            {
                Ok(self.mask.clone())
            }
            kind => Err(OutlierError::ShapeMismatch(format!(
                "{} mask has {} rows, cannot align to {} frames",
                kind.name(),
                rows,
                n_frames
            ))),
        }
    }

    /// Replace the mask with its frame-aligned form, keeping thresholds
    ///
    /// See [`OutlierResult::frame_aligned_mask`].
    pub fn aligned_to_frames(mut self, n_frames: usize) -> Result<Self, OutlierError> {
        self.mask = self.frame_aligned_mask(n_frames)?;
        Ok(self)
    }
}

/// Fail unless there are enough frames for a MAD threshold
pub(crate) fn require_frames(
    n_frames: usize,
    required: usize,
    detector: DetectorKind,
) -> Result<(), OutlierError> {
    if n_frames < required {
        return Err(OutlierError::InsufficientData(format!(
            "{} detector needs at least {} frames, got {}",
            detector.name(),
            required,
            n_frames
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn velocity_result(mask: Array2<bool>) -> OutlierResult {
        let n_keypoints = mask.ncols();
        OutlierResult {
            kind: DetectorKind::Velocity,
            mask,
            thresholds: Thresholds::PerKeypoint(Array1::zeros(n_keypoints)),
            pair_mask: None,
        }
    }

    #[test]
    fn test_velocity_mask_flags_frame_between_two_jumps() {
        // keypoint 0 glitches at frame 2, keypoint 1 never moves oddly
        let result = velocity_result(array![
            [false, false],
            [true, false],
            [true, false],
            [false, false]
        ]);
        let aligned = result.frame_aligned_mask(5).unwrap();
        assert_eq!(
            aligned,
            array![
                [false, false],
                [false, false],
                [true, false],
                [false, false],
                [false, false]
            ]
        );
    }

    #[test]
    fn test_velocity_mask_end_frames() {
        // keypoint 0 glitches at frame 0, keypoint 1 at the last frame,
        // keypoint 2 at frame 1 (its first jump must not flag frame 0)
        let result = velocity_result(array![
            [true, false, true],
            [false, false, true],
            [false, true, false]
        ]);
        let aligned = result.frame_aligned_mask(4).unwrap();
        assert_eq!(aligned.column(0).to_vec(), vec![true, false, false, false]);
        assert_eq!(aligned.column(1).to_vec(), vec![false, false, false, true]);
        assert_eq!(aligned.column(2).to_vec(), vec![false, true, false, false]);
    }

    #[test]
    fn test_frame_mask_alignment_checks_rows() {
        let result = OutlierResult {
            kind: DetectorKind::MedoidDistance,
            mask: Array2::from_elem((4, 2), false),
            thresholds: Thresholds::PerKeypoint(Array1::zeros(2)),
            pair_mask: None,
        };
        assert!(result.frame_aligned_mask(4).is_ok());
        assert!(matches!(
            result.frame_aligned_mask(5),
            Err(OutlierError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_thresholds_accessors() {
        let t = Thresholds::PerPair(Array2::zeros((2, 2)));
        assert!(t.per_pair().is_some());
        assert!(t.per_keypoint().is_none());
        assert!(Thresholds::NotApplicable.per_keypoint().is_none());
    }

    #[test]
    fn test_outlier_result_serializes_kind_and_thresholds() {
        let result = velocity_result(array![[true, false]]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "velocity");
        assert_eq!(json["thresholds"]["shape"], "per_keypoint");
        assert!(json.get("pair_mask").is_none());
    }
}
