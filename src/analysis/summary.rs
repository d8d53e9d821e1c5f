//! Outlier summary statistics
//!
//! Condenses a recording's combined outlier structure into counts that are
//! cheap to log, serialize and compare across a batch.
//!
//! # Example
//!
//! ```no_run
//! use keypoint_outliers::{clean_recording, OutlierConfig, Recording};
//! use keypoint_outliers::analysis::summary::summarize_outliers;
//! use ndarray::{Array2, Array3};
//!
//! let recording = Recording::new(Array3::zeros((100, 8, 2)), Array2::ones((100, 8)))?;
//! let cleaned = clean_recording(&recording, &OutlierConfig::new(6.0, 30.0))?;
//! let summary = summarize_outliers(&cleaned.outliers);
//!
//! println!("{:.2}% of points interpolated", summary.outlier_percentage);
//! # Ok::<(), keypoint_outliers::OutlierError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::detection::{CombinedOutliers, DetectorKind};

/// Outlier rate above which a recording is flagged (percent of all points)
pub const HIGH_OUTLIER_PERCENTAGE: f64 = 10.0;

/// Conditions worth a second look before modeling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningFlag {
    /// More than [`HIGH_OUTLIER_PERCENTAGE`] of all points were replaced
    HighOutlierRate,
    /// A keypoint was an outlier in every frame; its positions are synthetic
    KeypointFullyMasked(usize),
}

/// Number of entries one detector flagged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorCount {
    /// Detector
    pub detector: DetectorKind,
    /// Flagged entries in that detector's own mask
    pub count: usize,
}

/// Outlier statistics for one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    /// Frames in the recording
    pub n_frames: usize,

    /// Keypoints per frame
    pub n_keypoints: usize,

    /// Entries flagged in the combined mask
    pub outlier_count: usize,

    /// `outlier_count` as a percentage of frames × keypoints
    pub outlier_percentage: f64,

    /// Flagged frames per keypoint
    pub per_keypoint: Vec<usize>,

    /// Flagged entries per contributing detector
    pub per_detector: Vec<DetectorCount>,

    /// Conditions detected while summarizing
    pub flags: Vec<CleaningFlag>,
}

impl OutlierSummary {
    /// Whether any flag was raised
    pub fn needs_review(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// Summarize a combined outlier structure
pub fn summarize_outliers(outliers: &CombinedOutliers) -> OutlierSummary {
    let mask = outliers.mask();
    let (n_frames, n_keypoints) = mask.dim();

    let per_keypoint: Vec<usize> = mask
        .columns()
        .into_iter()
        .map(|column| column.iter().filter(|&&m| m).count())
        .collect();
    let outlier_count: usize = per_keypoint.iter().sum();

    let total = n_frames * n_keypoints;
    let outlier_percentage = if total == 0 {
        0.0
    } else {
        outlier_count as f64 / total as f64 * 100.0
    };

    let per_detector = outliers
        .sources()
        .iter()
        .map(|source| DetectorCount {
            detector: source.kind,
            count: source.outlier_count(),
        })
        .collect();

    let mut flags = Vec::new();
    if outlier_percentage > HIGH_OUTLIER_PERCENTAGE {
        flags.push(CleaningFlag::HighOutlierRate);
    }
    flags.extend(
        per_keypoint
            .iter()
            .enumerate()
            .filter(|&(_, &count)| n_frames > 0 && count == n_frames)
            .map(|(k, _)| CleaningFlag::KeypointFullyMasked(k)),
    );

    log::debug!(
        "Outlier summary: {} of {} points ({:.2}%), {} flags",
        outlier_count,
        total,
        outlier_percentage,
        flags.len()
    );

    OutlierSummary {
        n_frames,
        n_keypoints,
        outlier_count,
        outlier_percentage,
        per_keypoint,
        per_detector,
        flags,
    }
}
