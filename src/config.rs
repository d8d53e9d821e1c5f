//! Configuration parameters for outlier detection and cleaning
//!
//! `OutlierConfig` is deserializable from the project configuration mapping a
//! collaborator already holds. Only the fields listed here are read; any other
//! key in that mapping is ignored during deserialization and has no effect.

use serde::{Deserialize, Serialize};

use crate::error::OutlierError;

/// What the batch driver does when a recording fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop at the first failing recording and return its error
    #[default]
    HaltOnFirst,
    /// Record the failure under the recording's name and keep going
    CollectAndContinue,
}

/// Outlier detection configuration
///
/// The scale factor and frame rate have no defaults and must be given by the
/// caller; every other option falls back to the value documented on its field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// MAD multiplier for the medoid-distance and velocity detectors
    /// (typically 4.0-12.0). Higher values flag fewer outliers.
    pub outlier_scale_factor: f64,

    /// Frames per second, used to express velocities per second
    pub fps: f64,

    /// Fraction of the other keypoints that must be pairwise outliers before a
    /// keypoint is flagged by the keypoint-distance detector (default: 0.3)
    #[serde(default = "default_threshold_percentage")]
    pub outlier_threshold_percentage: f64,

    /// MAD multiplier for the keypoint-distance detector
    /// (default: `outlier_scale_factor`)
    #[serde(default)]
    pub keypoint_distance_scale_factor: Option<f64>,

    /// Run the keypoint-distance detector in addition to the medoid detector
    /// (default: false)
    #[serde(default)]
    pub use_keypoint_distance_outliers: bool,

    /// Run the velocity detector in addition to the medoid detector
    /// (default: false)
    #[serde(default)]
    pub use_velocity_outliers: bool,

    /// Expected axes per keypoint: 2 for (x, y), 3 for (x, y, likelihood).
    /// When unset, either layout is accepted.
    #[serde(default)]
    pub keypoint_dim: Option<usize>,

    /// Batch failure handling (default: halt on first error)
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

fn default_threshold_percentage() -> f64 {
    0.3
}

impl OutlierConfig {
    /// Create a configuration with the required parameters and defaults for
    /// everything else
    ///
    /// # Example
    ///
    /// ```
    /// use keypoint_outliers::OutlierConfig;
    ///
    /// let mut config = OutlierConfig::new(6.0, 30.0);
    /// config.use_keypoint_distance_outliers = true;
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(outlier_scale_factor: f64, fps: f64) -> Self {
        Self {
            outlier_scale_factor,
            fps,
            outlier_threshold_percentage: default_threshold_percentage(),
            keypoint_distance_scale_factor: None,
            use_keypoint_distance_outliers: false,
            use_velocity_outliers: false,
            keypoint_dim: None,
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Scale factor used by the keypoint-distance detector
    pub fn pairwise_scale_factor(&self) -> f64 {
        self.keypoint_distance_scale_factor
            .unwrap_or(self.outlier_scale_factor)
    }

    /// Check every option against its valid range
    ///
    /// # Errors
    ///
    /// Returns `OutlierError::InvalidConfig` naming the first offending field
    pub fn validate(&self) -> Result<(), OutlierError> {
        validate_scale_factor(self.outlier_scale_factor)?;
        validate_scale_factor(self.pairwise_scale_factor())?;

        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(OutlierError::InvalidConfig(format!(
                "fps must be positive and finite, got {}",
                self.fps
            )));
        }

        validate_threshold_percentage(self.outlier_threshold_percentage)?;

        if let Some(dim) = self.keypoint_dim {
            if dim != 2 && dim != 3 {
                return Err(OutlierError::InvalidConfig(format!(
                    "keypoint_dim must be 2 or 3, got {}",
                    dim
                )));
            }
        }

        Ok(())
    }
}

/// Reject negative or non-finite MAD multipliers
pub(crate) fn validate_scale_factor(scale_factor: f64) -> Result<(), OutlierError> {
    if !scale_factor.is_finite() || scale_factor < 0.0 {
        return Err(OutlierError::InvalidConfig(format!(
            "outlier scale factor must be finite and non-negative, got {}",
            scale_factor
        )));
    }
    Ok(())
}

/// Reject consensus fractions outside [0, 1]
pub(crate) fn validate_threshold_percentage(percentage: f64) -> Result<(), OutlierError> {
    if !(0.0..=1.0).contains(&percentage) {
        return Err(OutlierError::InvalidConfig(format!(
            "outlier_threshold_percentage must be in [0.0, 1.0], got {}",
            percentage
        )));
    }
    Ok(())
}
