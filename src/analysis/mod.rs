//! Result aggregation and reporting
//!
//! Turns detector output into things a caller can inspect or persist:
//! - Cleaned recording and batch report types
//! - Outlier summaries with review flags
//! - Batch metadata
//! - Before/after trace data for diagnostic plots

pub mod diagnostics;
pub mod metadata;
pub mod result;
pub mod summary;
