//! Batch metadata structures

use serde::{Deserialize, Serialize};

use crate::config::OutlierConfig;
use crate::detection::DetectorKind;

/// Metadata describing one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMetadata {
    /// Crate version that produced the results
    pub algorithm_version: String,

    /// Detectors run on every recording
    pub detectors_used: Vec<DetectorKind>,

    /// Recordings cleaned successfully
    pub recordings_processed: usize,

    /// Recordings rejected (collect policy only)
    pub recordings_failed: usize,

    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: f64,
}

impl BatchMetadata {
    /// Metadata for a run with `config`, before any recording is processed
    pub fn for_config(config: &OutlierConfig) -> Self {
        Self {
            detectors_used: detectors_for(config),
            ..Self::default()
        }
    }
}

impl Default for BatchMetadata {
    fn default() -> Self {
        Self {
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            detectors_used: vec![],
            recordings_processed: 0,
            recordings_failed: 0,
            processing_time_ms: 0.0,
        }
    }
}

/// Detectors a configuration enables, in combination order
pub fn detectors_for(config: &OutlierConfig) -> Vec<DetectorKind> {
    let mut detectors = vec![DetectorKind::MedoidDistance];
    if config.use_keypoint_distance_outliers {
        detectors.push(DetectorKind::KeypointDistance);
    }
    if config.use_velocity_outliers {
        detectors.push(DetectorKind::Velocity);
    }
    detectors
}
