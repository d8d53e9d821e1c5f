//! Before/after trace data for diagnostic plots
//!
//! This module does not draw anything. It prepares the series a plotting
//! collaborator needs to show, per keypoint, a metric computed on the raw and
//! on the cleaned coordinates, the detector threshold, and the frames that
//! were flagged. `TraceSet` serializes to JSON for hand-off to external tools.

use ndarray::{s, Array1, Array2, ArrayView3, Axis};
use serde::Serialize;

use crate::detection::{CombinedOutliers, DetectorKind};
use crate::error::OutlierError;
use crate::metrics::{distance_to_medoid, keypoint_to_keypoint_distances, keypoint_velocities};

/// Line label for the trace computed on raw coordinates
pub const ORIGINAL_LABEL: &str = "Original";

/// Line label for the trace computed on cleaned coordinates
pub const INTERPOLATED_LABEL: &str = "Interpolated";

/// Several aligned series (rows = frames, columns = panels) for one figure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSet {
    /// Figure title
    pub title: String,

    /// Label per series
    pub line_labels: Vec<String>,

    /// Series, all with identical shape
    pub traces: Vec<Array2<f64>>,

    /// Label per column (one panel each)
    pub column_labels: Vec<String>,

    /// Threshold line per column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Array1<f64>>,

    /// Rows to shade per column, same shape as the traces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shading_mask: Option<Array2<bool>>,
}

impl TraceSet {
    /// Build a trace set, checking that all parts line up
    ///
    /// Columns without explicit labels are named "Keypoint {i}".
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `traces` is empty
    /// - `ShapeMismatch` if traces, labels, thresholds or shading disagree
    pub fn new(
        title: impl Into<String>,
        traces: Vec<(String, Array2<f64>)>,
        column_labels: Option<Vec<String>>,
        thresholds: Option<Array1<f64>>,
        shading_mask: Option<Array2<bool>>,
    ) -> Result<Self, OutlierError> {
        let shape = traces
            .first()
            .map(|(_, t)| t.dim())
            .ok_or_else(|| OutlierError::InvalidInput("traces cannot be empty".to_string()))?;

        if let Some((label, _)) = traces.iter().find(|(_, t)| t.dim() != shape) {
            return Err(OutlierError::ShapeMismatch(format!(
                "trace '{}' does not match shape {:?}",
                label, shape
            )));
        }

        let n_columns = shape.1;
        let column_labels = match column_labels {
            Some(labels) if labels.len() != n_columns => {
                return Err(OutlierError::ShapeMismatch(format!(
                    "{} column labels for {} columns",
                    labels.len(),
                    n_columns
                )))
            }
            Some(labels) => labels,
            None => (0..n_columns).map(|i| format!("Keypoint {}", i)).collect(),
        };

        if let Some(t) = &thresholds {
            if t.len() != n_columns {
                return Err(OutlierError::ShapeMismatch(format!(
                    "{} thresholds for {} columns",
                    t.len(),
                    n_columns
                )));
            }
        }

        if let Some(mask) = &shading_mask {
            if mask.dim() != shape {
                return Err(OutlierError::ShapeMismatch(format!(
                    "shading mask {:?} does not match traces {:?}",
                    mask.dim(),
                    shape
                )));
            }
        }

        let (line_labels, traces) = traces.into_iter().unzip();

        Ok(Self {
            title: title.into(),
            line_labels,
            traces,
            column_labels,
            thresholds,
            shading_mask,
        })
    }

    /// Rows per series
    pub fn n_rows(&self) -> usize {
        self.traces.first().map_or(0, |t| t.nrows())
    }

    /// Columns (panels) per series
    pub fn n_columns(&self) -> usize {
        self.column_labels.len()
    }
}

/// Distance-to-medoid of raw vs. cleaned coordinates
///
/// Thresholds come from the medoid-distance detector; shading is the combined
/// mask.
pub fn medoid_distance_traces(
    recording_name: &str,
    raw: ArrayView3<f64>,
    cleaned: ArrayView3<f64>,
    outliers: &CombinedOutliers,
    bodyparts: Option<&[String]>,
) -> Result<TraceSet, OutlierError> {
    let thresholds = outliers
        .source(DetectorKind::MedoidDistance)
        .and_then(|r| r.thresholds.per_keypoint())
        .cloned();

    TraceSet::new(
        recording_name,
        vec![
            (ORIGINAL_LABEL.to_string(), distance_to_medoid(raw)?),
            (INTERPOLATED_LABEL.to_string(), distance_to_medoid(cleaned)?),
        ],
        bodyparts.map(|b| b.to_vec()),
        thresholds,
        Some(outliers.mask().clone()),
    )
}

/// Velocity of raw vs. cleaned coordinates
///
/// Rows are frame transitions. Shading marks transitions that land on a
/// flagged frame. Thresholds are included when the velocity detector ran.
pub fn velocity_traces(
    recording_name: &str,
    raw: ArrayView3<f64>,
    cleaned: ArrayView3<f64>,
    fps: f64,
    outliers: &CombinedOutliers,
    bodyparts: Option<&[String]>,
) -> Result<TraceSet, OutlierError> {
    let thresholds = outliers
        .source(DetectorKind::Velocity)
        .and_then(|r| r.thresholds.per_keypoint())
        .cloned();
    let shading = outliers.mask().slice(s![1.., ..]).to_owned();

    TraceSet::new(
        format!("{} - Velocity Outliers", recording_name),
        vec![
            (ORIGINAL_LABEL.to_string(), keypoint_velocities(raw, fps)?),
            (INTERPOLATED_LABEL.to_string(), keypoint_velocities(cleaned, fps)?),
        ],
        bodyparts.map(|b| b.to_vec()),
        thresholds,
        Some(shading),
    )
}

/// Keypoint-to-keypoint distances of raw vs. cleaned coordinates
///
/// One trace set per keypoint k; its columns are the other keypoints j and
/// hold distance(k, j). Per-pair thresholds are included when the
/// keypoint-distance detector ran; shading is keypoint k's combined mask.
pub fn keypoint_distance_traces(
    recording_name: &str,
    raw: ArrayView3<f64>,
    cleaned: ArrayView3<f64>,
    outliers: &CombinedOutliers,
    bodyparts: Option<&[String]>,
) -> Result<Vec<TraceSet>, OutlierError> {
    let raw_distances = keypoint_to_keypoint_distances(raw)?;
    let cleaned_distances = keypoint_to_keypoint_distances(cleaned)?;
    let (n_frames, n_keypoints, _) = raw_distances.dim();

    let labels: Vec<String> = match bodyparts {
        Some(b) => b.to_vec(),
        None => (0..n_keypoints).map(|i| format!("Keypoint {}", i)).collect(),
    };
    if labels.len() != n_keypoints {
        return Err(OutlierError::ShapeMismatch(format!(
            "{} body parts for {} keypoints",
            labels.len(),
            n_keypoints
        )));
    }

    let pair_thresholds = outliers
        .source(DetectorKind::KeypointDistance)
        .and_then(|r| r.thresholds.per_pair());

    let mut sets = Vec::with_capacity(n_keypoints);
    for k in 0..n_keypoints {
        let others: Vec<usize> = (0..n_keypoints).filter(|&j| j != k).collect();

        let original = raw_distances
            .index_axis(Axis(1), k)
            .select(Axis(1), &others);
        let interpolated = cleaned_distances
            .index_axis(Axis(1), k)
            .select(Axis(1), &others);
        let thresholds = pair_thresholds.map(|t| t.row(k).select(Axis(0), &others));

        let flagged = outliers.mask().column(k).to_owned();
        let shading = Array2::from_shape_fn((n_frames, others.len()), |(f, _)| flagged[f]);

        sets.push(TraceSet::new(
            format!("{} - Distances from {}", recording_name, labels[k]),
            vec![
                (ORIGINAL_LABEL.to_string(), original),
                (INTERPOLATED_LABEL.to_string(), interpolated),
            ],
            Some(others.iter().map(|&j| labels[j].clone()).collect()),
            thresholds,
            Some(shading),
        )?);
    }

    Ok(sets)
}
