//! Batch processing of recording collections
//!
//! - Sequential and rayon-parallel drivers over insertion-ordered recordings
//! - Per-recording reporter callbacks
//! - Failure handling per [`ErrorPolicy`](crate::config::ErrorPolicy)

pub mod driver;
pub mod reporter;

pub use driver::{filter_outlier_maps, filter_outliers, filter_outliers_parallel, BatchOutput};
pub use reporter::{LoggingReporter, RecordingReporter};
