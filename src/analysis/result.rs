//! Cleaning result types

use indexmap::IndexMap;
use serde::Serialize;

use super::metadata::BatchMetadata;
use super::summary::{summarize_outliers, OutlierSummary};
use crate::data::Recording;
use crate::detection::CombinedOutliers;

/// One recording after outlier removal
#[derive(Debug, Clone, Serialize)]
pub struct CleanedRecording {
    /// Recording with interpolated coordinates and rewritten confidences
    pub recording: Recording,

    /// Combined outlier mask with per-detector provenance
    pub outliers: CombinedOutliers,
}

impl CleanedRecording {
    /// Outlier statistics for this recording
    pub fn summary(&self) -> OutlierSummary {
        summarize_outliers(&self.outliers)
    }
}

/// Serializable overview of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Summary per cleaned recording, in batch order
    pub summaries: IndexMap<String, OutlierSummary>,

    /// Failure reason per rejected recording
    pub failures: IndexMap<String, String>,

    /// Run metadata
    pub metadata: BatchMetadata,
}

impl BatchReport {
    /// Recordings whose summary raised a flag
    pub fn recordings_needing_review(&self) -> Vec<&str> {
        self.summaries
            .iter()
            .filter(|(_, s)| s.needs_review())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
