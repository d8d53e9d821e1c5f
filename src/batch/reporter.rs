//! Per-recording progress callbacks
//!
//! The batch driver calls a [`RecordingReporter`] synchronously after each
//! recording is cleaned, on the calling thread and in batch order. Plotting,
//! progress bars or custom logging hook in here.

use ndarray::{Array3, Zip};

use crate::analysis::summary::summarize_outliers;
use crate::detection::CombinedOutliers;

/// Receives each recording right after it is cleaned
pub trait RecordingReporter {
    /// Called once per successfully cleaned recording
    ///
    /// # Arguments
    ///
    /// * `name` - Recording name (map key)
    /// * `raw` - Coordinates before cleaning
    /// * `cleaned` - Coordinates after interpolation
    /// * `outliers` - Combined outlier structure for the recording
    fn on_recording_processed(
        &mut self,
        name: &str,
        raw: &Array3<f64>,
        cleaned: &Array3<f64>,
        outliers: &CombinedOutliers,
    );
}

impl<F> RecordingReporter for F
where
    F: FnMut(&str, &Array3<f64>, &Array3<f64>, &CombinedOutliers),
{
    fn on_recording_processed(
        &mut self,
        name: &str,
        raw: &Array3<f64>,
        cleaned: &Array3<f64>,
        outliers: &CombinedOutliers,
    ) {
        self(name, raw, cleaned, outliers)
    }
}

/// Reporter that logs an outlier summary per recording
///
/// Keypoints are labeled with body-part names when given.
#[derive(Debug, Clone, Default)]
pub struct LoggingReporter {
    bodyparts: Option<Vec<String>>,
    reported: usize,
}

impl LoggingReporter {
    /// Reporter with index-based keypoint labels
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter with body-part labels
    pub fn with_bodyparts(bodyparts: Vec<String>) -> Self {
        Self {
            bodyparts: Some(bodyparts),
            reported: 0,
        }
    }

    /// Recordings reported so far
    pub fn reported(&self) -> usize {
        self.reported
    }

    fn label(&self, keypoint: usize) -> String {
        self.bodyparts
            .as_ref()
            .and_then(|parts| parts.get(keypoint))
            .cloned()
            .unwrap_or_else(|| format!("keypoint {}", keypoint))
    }
}

impl RecordingReporter for LoggingReporter {
    fn on_recording_processed(
        &mut self,
        name: &str,
        raw: &Array3<f64>,
        cleaned: &Array3<f64>,
        outliers: &CombinedOutliers,
    ) {
        self.reported += 1;
        let summary = summarize_outliers(outliers);

        log::info!(
            "{}: {} of {} points interpolated ({:.2}%)",
            name,
            summary.outlier_count,
            summary.n_frames * summary.n_keypoints,
            summary.outlier_percentage
        );

        for (k, &count) in summary.per_keypoint.iter().enumerate() {
            if count > 0 {
                log::info!("  {}: {} frames", self.label(k), count);
            }
        }

        let mut max_shift = 0.0f64;
        Zip::from(raw).and(cleaned).for_each(|&a, &b| {
            max_shift = max_shift.max((a - b).abs());
        });
        log::debug!("{}: largest coordinate correction {:.3}", name, max_shift);

        if summary.needs_review() {
            log::warn!("{}: needs review ({:?})", name, summary.flags);
        }
    }
}
