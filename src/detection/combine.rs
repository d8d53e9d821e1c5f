//! Outlier mask combination
//!
//! Merges the masks of several detectors with a logical OR: one detector
//! flagging an entry is enough to mark it corrupted. Every source result is
//! kept (mask, thresholds, pair mask) so diagnostics can show which detector
//! flagged what.

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use super::{DetectorKind, OutlierResult};
use crate::error::OutlierError;

/// Combined outlier mask plus the detector results it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedOutliers {
    mask: Array2<bool>,
    sources: Vec<OutlierResult>,
}

impl CombinedOutliers {
    /// Authoritative mask (frames × keypoints)
    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// Detector results, in the order they were combined
    pub fn sources(&self) -> &[OutlierResult] {
        &self.sources
    }

    /// Result of one detector, if it took part
    pub fn source(&self, kind: DetectorKind) -> Option<&OutlierResult> {
        self.sources.iter().find(|r| r.kind == kind)
    }

    /// Detectors that took part
    pub fn detectors(&self) -> Vec<DetectorKind> {
        self.sources.iter().map(|r| r.kind).collect()
    }

    /// Whether an entry is flagged in the combined mask
    pub fn is_outlier(&self, frame: usize, keypoint: usize) -> bool {
        self.mask.get((frame, keypoint)).copied().unwrap_or(false)
    }

    /// Detectors that flagged an entry (empty when it is not an outlier)
    pub fn flagged_by(&self, frame: usize, keypoint: usize) -> Vec<DetectorKind> {
        self.sources
            .iter()
            .filter(|r| r.mask.get((frame, keypoint)).copied().unwrap_or(false))
            .map(|r| r.kind)
            .collect()
    }

    /// Number of flagged entries in the combined mask
    pub fn outlier_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Take ownership of the mask and sources
    pub fn into_parts(self) -> (Array2<bool>, Vec<OutlierResult>) {
        (self.mask, self.sources)
    }
}

/// Combine detector results into one mask (logical OR)
///
/// Masks must already share the frame axis; align velocity results with
/// [`OutlierResult::aligned_to_frames`] first.
///
/// # Arguments
///
/// * `results` - Detector results, at least one, each detector at most once
///
/// # Returns
///
/// `CombinedOutliers` whose mask is the elementwise OR of all source masks
///
/// # Errors
///
/// - `InvalidInput` if `results` is empty or names a detector twice
/// - `ShapeMismatch` if the source masks differ in shape
pub fn combine_outliers(results: Vec<OutlierResult>) -> Result<CombinedOutliers, OutlierError> {
    let first = results.first().ok_or_else(|| {
        OutlierError::InvalidInput("no outlier results to combine".to_string())
    })?;
    let shape = first.mask.dim();

    for (i, result) in results.iter().enumerate() {
        if results[..i].iter().any(|r| r.kind == result.kind) {
            return Err(OutlierError::InvalidInput(format!(
                "{} detector given more than once",
                result.kind.name()
            )));
        }
        if result.mask.dim() != shape {
            return Err(OutlierError::ShapeMismatch(format!(
                "{} mask is {:?} but {} mask is {:?}",
                result.kind.name(),
                result.mask.dim(),
                first.kind.name(),
                shape
            )));
        }
    }

    let mut mask = Array2::from_elem(shape, false);
    for result in &results {
        Zip::from(&mut mask)
            .and(&result.mask)
            .for_each(|combined, &flag| *combined |= flag);
    }

    log::debug!(
        "Combined {} detector masks: {} outliers",
        results.len(),
        mask.iter().filter(|&&m| m).count()
    );

    Ok(CombinedOutliers {
        mask,
        sources: results,
    })
}
