//! Distance metrics derived from raw keypoint coordinates
//!
//! Per-frame geometric signals that feed the robust outlier detectors:
//! - Distance to the per-frame medoid (coordinate-wise median position)
//! - Frame-to-frame keypoint velocity
//! - Keypoint-to-keypoint distances
//!
//! Only the spatial axes (x, y) are used, even when a likelihood axis is
//! present. Metric arrays are derived on demand and never stored.

pub mod medoid;
pub mod pairwise;
pub mod velocity;

pub use medoid::distance_to_medoid;
pub use pairwise::keypoint_to_keypoint_distances;
pub use velocity::keypoint_velocities;

/// Median of `values`, reordering the slice in place
///
/// Even-length inputs average the two middle values. Callers guarantee a
/// non-empty slice of finite values.
pub(crate) fn median_in_place(values: &mut [f64]) -> f64 {
    debug_assert!(!values.is_empty());
    values.sort_unstable_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) * 0.5
    } else {
        values[mid]
    }
}
