//! # Keypoint Outliers
//!
//! Robust outlier detection and gap filling for pose-tracking keypoints,
//! run before downstream behavior modeling.
//!
//! ## Features
//!
//! - **Medoid distance**: flags keypoints far from the body's median position
//! - **Keypoint distance**: flags keypoints inconsistent with most of the skeleton
//! - **Velocity**: flags implausible frame-to-frame jumps
//! - **Cleaning**: linear interpolation of flagged positions, confidence rewrite
//! - **Batch driver**: insertion-ordered recordings, optional rayon parallelism
//!
//! ## Quick Start
//!
//! ```no_run
//! use keypoint_outliers::{clean_recording, OutlierConfig, Recording};
//! use ndarray::{Array2, Array3};
//!
//! // Coordinates are frames × keypoints × (x, y)
//! let recording = Recording::new(Array3::zeros((1000, 8, 2)), Array2::ones((1000, 8)))?;
//!
//! let config = OutlierConfig::new(6.0, 30.0);
//! let cleaned = clean_recording(&recording, &config)?;
//!
//! println!("{} outliers interpolated", cleaned.outliers.outlier_count());
//! # Ok::<(), keypoint_outliers::OutlierError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Coordinates → Metrics → MAD Detectors → Combine → Interpolate → Output
//! ```
//!
//! Every detector uses the same robust rule: a value is an outlier when it
//! exceeds `median + scale_factor × MAD` of its column over all frames.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod batch;
pub mod cleaning;
pub mod config;
pub mod data;
pub mod detection;
pub mod error;
pub mod metrics;

// Re-export main types
pub use analysis::result::{BatchReport, CleanedRecording};
pub use analysis::summary::OutlierSummary;
pub use batch::{
    filter_outlier_maps, filter_outliers, filter_outliers_parallel, BatchOutput, LoggingReporter,
    RecordingReporter,
};
pub use config::{ErrorPolicy, OutlierConfig};
pub use data::{collect_recordings_from_maps, recordings_from_maps, Recording, RecordingSet};
pub use detection::{CombinedOutliers, DetectorKind, OutlierResult};
pub use error::OutlierError;

use cleaning::{apply_outlier_mask, interpolate_keypoints};
use detection::{
    combine_outliers, find_keypoint_distance_outliers, find_medoid_distance_outliers,
    find_missing_points, find_velocity_outliers,
};

/// Detect and remove outliers from one recording
///
/// Runs the medoid-distance detector, plus the keypoint-distance and velocity
/// detectors when enabled, combines their masks, interpolates the flagged
/// positions and zeroes their confidences.
///
/// Missing detections (NaN or infinite x/y) are gap-filled before the
/// detectors run and appear in the combined mask as
/// [`DetectorKind::NonFinite`], so they are interpolated like outliers.
///
/// # Arguments
///
/// * `recording` - Raw coordinates and confidences
/// * `config` - Detection parameters
///
/// # Returns
///
/// `CleanedRecording` with the cleaned copy and the combined outlier structure.
/// The input is not modified.
///
/// # Errors
///
/// - `InvalidConfig` if `config` fails validation
/// - `ShapeMismatch` if the recording's keypoint layout differs from
///   `config.keypoint_dim`
/// - Any detector error (e.g. `InsufficientData` for too few frames)
///
/// # Example
///
/// ```
/// use keypoint_outliers::{clean_recording, OutlierConfig, Recording};
/// use ndarray::{Array2, Array3};
///
/// let mut coords = Array3::<f64>::zeros((10, 3, 2));
/// for f in 0..10 {
///     coords[[f, 1, 0]] = 1.0;
///     coords[[f, 2, 1]] = 1.0;
/// }
/// coords[[9, 0, 0]] = 1000.0;
/// coords[[9, 0, 1]] = 1000.0;
/// let recording = Recording::new(coords, Array2::ones((10, 3)))?;
///
/// let cleaned = clean_recording(&recording, &OutlierConfig::new(4.0, 30.0))?;
/// assert!(cleaned.outliers.is_outlier(9, 0));
/// assert_eq!(cleaned.recording.coordinates()[[9, 0, 0]], 0.0);
/// assert_eq!(cleaned.recording.confidences()[[9, 0]], 0.0);
/// # Ok::<(), keypoint_outliers::OutlierError>(())
/// ```
pub fn clean_recording(
    recording: &Recording,
    config: &OutlierConfig,
) -> Result<CleanedRecording, OutlierError> {
    config.validate()?;

    if let Some(dim) = config.keypoint_dim {
        if recording.keypoint_dim() != dim {
            return Err(OutlierError::ShapeMismatch(format!(
                "expected {} axes per keypoint, got {}",
                dim,
                recording.keypoint_dim()
            )));
        }
    }

    let raw = recording.coordinates().view();
    let n_frames = recording.n_frames();

    log::debug!(
        "Cleaning recording: {} frames, {} keypoints",
        n_frames,
        recording.n_keypoints()
    );

    // Step 1: Fill missing detections so every metric sees finite values
    let missing = find_missing_points(raw)?;
    let filled = if missing.outlier_count() > 0 {
        Some(interpolate_keypoints(raw, missing.mask.view())?)
    } else {
        None
    };
    let coords = filled.as_ref().map_or(raw, |f| f.view());

    // Step 2: Run enabled detectors
    let mut results = vec![find_medoid_distance_outliers(
        coords,
        config.outlier_scale_factor,
    )?];

    if config.use_keypoint_distance_outliers {
        results.push(find_keypoint_distance_outliers(
            coords,
            config.pairwise_scale_factor(),
            config.outlier_threshold_percentage,
        )?);
    }

    if config.use_velocity_outliers {
        results.push(
            find_velocity_outliers(coords, config.outlier_scale_factor, config.fps)?
                .aligned_to_frames(n_frames)?,
        );
    }

    if filled.is_some() {
        results.push(missing);
    }

    // Step 3: Combine masks
    let outliers = combine_outliers(results)?;

    // Step 4: Interpolate and rewrite confidences
    let (cleaned_coords, cleaned_confs) = apply_outlier_mask(
        raw,
        recording.confidences().view(),
        outliers.mask().view(),
    )?;

    Ok(CleanedRecording {
        recording: recording.with_data(cleaned_coords, cleaned_confs)?,
        outliers,
    })
}
