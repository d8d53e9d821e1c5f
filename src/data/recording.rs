//! Recording type and recording maps

use std::ops::Range;

use indexmap::IndexMap;
use ndarray::{Array2, Array3};
use serde::Serialize;

use super::{check_frame_keypoint_shape, validate_layout};
use crate::error::OutlierError;

/// Recordings keyed by name, in insertion order
pub type RecordingSet = IndexMap<String, Recording>;

/// One independent unit of tracking data (one video/session)
///
/// Holds a coordinate tensor (frames × keypoints × dims) and the matching
/// confidence tensor (frames × keypoints). Shapes are checked on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recording {
    coordinates: Array3<f64>,
    confidences: Array2<f64>,
    bodyparts: Option<Vec<String>>,
    start_frame: usize,
}

impl Recording {
    /// Create a recording from coordinates and confidences
    ///
    /// NaN or infinite x/y values are accepted and mark missing detections;
    /// cleaning treats them as outliers and interpolates them.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` / `InsufficientData` if the layout is malformed
    ///   (see [`validate_layout`](super::validate_layout))
    /// - `ShapeMismatch` if confidences disagree on frame or keypoint count
    pub fn new(coordinates: Array3<f64>, confidences: Array2<f64>) -> Result<Self, OutlierError> {
        validate_layout(coordinates.view())?;
        check_frame_keypoint_shape(coordinates.view(), confidences.view(), "confidences")?;

        Ok(Self {
            coordinates,
            confidences,
            bodyparts: None,
            start_frame: 0,
        })
    }

    /// Attach body-part names (one per keypoint, labeling only)
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the list length differs from the keypoint count
    pub fn with_bodyparts(mut self, bodyparts: Vec<String>) -> Result<Self, OutlierError> {
        if bodyparts.len() != self.n_keypoints() {
            return Err(OutlierError::ShapeMismatch(format!(
                "{} body parts given for {} keypoints",
                bodyparts.len(),
                self.n_keypoints()
            )));
        }
        self.bodyparts = Some(bodyparts);
        Ok(self)
    }

    /// Set the index of the first frame in the source video
    pub fn with_start_frame(mut self, start_frame: usize) -> Self {
        self.start_frame = start_frame;
        self
    }

    /// Coordinate tensor (frames × keypoints × dims)
    pub fn coordinates(&self) -> &Array3<f64> {
        &self.coordinates
    }

    /// Confidence tensor (frames × keypoints)
    pub fn confidences(&self) -> &Array2<f64> {
        &self.confidences
    }

    /// Body-part names, if attached
    pub fn bodyparts(&self) -> Option<&[String]> {
        self.bodyparts.as_deref()
    }

    /// Number of frames
    pub fn n_frames(&self) -> usize {
        self.coordinates.dim().0
    }

    /// Number of keypoints per frame
    pub fn n_keypoints(&self) -> usize {
        self.coordinates.dim().1
    }

    /// Axes per keypoint (2 or 3)
    pub fn keypoint_dim(&self) -> usize {
        self.coordinates.dim().2
    }

    /// Source-video frame indices covered by this recording
    pub fn frame_range(&self) -> Range<usize> {
        self.start_frame..self.start_frame + self.n_frames()
    }

    /// Replace coordinates and confidences, keeping labels and frame range
    ///
    /// Used to build the cleaned copy of a recording; shapes must not change.
    pub(crate) fn with_data(
        &self,
        coordinates: Array3<f64>,
        confidences: Array2<f64>,
    ) -> Result<Self, OutlierError> {
        if coordinates.dim() != self.coordinates.dim() || confidences.dim() != self.confidences.dim() {
            return Err(OutlierError::ShapeMismatch(
                "cleaned arrays must keep the recording's shape".to_string(),
            ));
        }

        Ok(Self {
            coordinates,
            confidences,
            bodyparts: self.bodyparts.clone(),
            start_frame: self.start_frame,
        })
    }

    /// Split into (coordinates, confidences)
    pub fn into_parts(self) -> (Array3<f64>, Array2<f64>) {
        (self.coordinates, self.confidences)
    }
}

/// Build a recording map from the coordinate and confidence maps handed over
/// by the loading collaborator
///
/// Order follows `coordinates`. When `bodyparts` is given it is attached to
/// every recording.
///
/// # Errors
///
/// The first failing recording's error, named via
/// [`OutlierError::for_recording`]; a key present in only one of the two maps
/// is a `ShapeMismatch`. Use [`collect_recordings_from_maps`] to keep going
/// past bad recordings.
pub fn recordings_from_maps(
    coordinates: IndexMap<String, Array3<f64>>,
    confidences: IndexMap<String, Array2<f64>>,
    bodyparts: Option<&[String]>,
) -> Result<RecordingSet, OutlierError> {
    let (recordings, failures) = build_recordings(coordinates, confidences, bodyparts, true);
    match failures.into_iter().next() {
        Some((_, err)) => Err(err),
        None => Ok(recordings),
    }
}

/// Build a recording map, setting aside recordings that cannot be built
///
/// Same rules as [`recordings_from_maps`], but every bad recording is
/// returned in the failure map (keyed by name, errors named via
/// [`OutlierError::for_recording`]) and the rest are kept. Orphan confidence
/// entries are reported after the coordinate-ordered failures.
pub fn collect_recordings_from_maps(
    coordinates: IndexMap<String, Array3<f64>>,
    confidences: IndexMap<String, Array2<f64>>,
    bodyparts: Option<&[String]>,
) -> (RecordingSet, IndexMap<String, OutlierError>) {
    build_recordings(coordinates, confidences, bodyparts, false)
}

fn build_recordings(
    coordinates: IndexMap<String, Array3<f64>>,
    mut confidences: IndexMap<String, Array2<f64>>,
    bodyparts: Option<&[String]>,
    stop_at_first: bool,
) -> (RecordingSet, IndexMap<String, OutlierError>) {
    let mut recordings = RecordingSet::with_capacity(coordinates.len());
    let mut failures = IndexMap::new();

    for (name, coords) in coordinates {
        let confs = confidences.shift_remove(&name);
        match build_recording(coords, confs, bodyparts) {
            Ok(recording) => {
                recordings.insert(name, recording);
            }
            Err(err) => {
                let err = err.for_recording(&name);
                failures.insert(name, err);
                if stop_at_first {
                    return (recordings, failures);
                }
            }
        }
    }

    for name in confidences.into_keys() {
        let err = OutlierError::ShapeMismatch("confidences given without coordinates".to_string())
            .for_recording(&name);
        failures.insert(name, err);
        if stop_at_first {
            break;
        }
    }

    (recordings, failures)
}

fn build_recording(
    coordinates: Array3<f64>,
    confidences: Option<Array2<f64>>,
    bodyparts: Option<&[String]>,
) -> Result<Recording, OutlierError> {
    let confidences = confidences.ok_or_else(|| {
        OutlierError::ShapeMismatch("no confidences for this recording".to_string())
    })?;

    let recording = Recording::new(coordinates, confidences)?;
    match bodyparts {
        Some(parts) => recording.with_bodyparts(parts.to_vec()),
        None => Ok(recording),
    }
}
