//! Error types for outlier detection and cleaning

use std::fmt;

/// Errors that can occur while detecting or interpolating outliers
#[derive(Debug, Clone)]
pub enum OutlierError {
    /// Malformed input arrays (wrong axis count, empty, non-finite values)
    InvalidInput(String),

    /// Configuration value out of range
    InvalidConfig(String),

    /// Coordinate, confidence, mask or body-part shapes disagree
    ShapeMismatch(String),

    /// Not enough frames or keypoints for the requested statistic
    InsufficientData(String),

    /// Failure attributed to a single recording of a batch
    Recording {
        /// Recording name (map key)
        name: String,
        /// Underlying failure
        source: Box<OutlierError>,
    },
}

impl OutlierError {
    /// Attach a recording name to this error
    ///
    /// Errors that already name a recording are returned unchanged.
    pub fn for_recording(self, name: &str) -> Self {
        match self {
            OutlierError::Recording { .. } => self,
            other => OutlierError::Recording {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Innermost error, skipping any recording attribution
    pub fn root(&self) -> &OutlierError {
        match self {
            OutlierError::Recording { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for OutlierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            OutlierError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            OutlierError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            OutlierError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            OutlierError::Recording { name, source } => {
                write!(f, "Recording '{}': {}", name, source)
            }
        }
    }
}

impl std::error::Error for OutlierError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutlierError::Recording { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
