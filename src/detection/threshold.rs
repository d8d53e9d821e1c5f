//! Median + MAD (Median Absolute Deviation) thresholding
//!
//! A robust analogue of a z-score cut-off: the median and MAD barely move when
//! a minority of values are corrupted, so the outliers cannot inflate their own
//! threshold.
//!
//! `threshold = MAD * scale_factor + median`, and a value is an outlier when it
//! is strictly greater than the threshold.
//!
//! A column with zero MAD (e.g. perfectly static tracking) gets a threshold
//! equal to its median, so any larger value at all is flagged. This is not
//! an error: the formula only multiplies by MAD and never divides.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

use super::MIN_METRIC_ROWS;
use crate::config::validate_scale_factor;
use crate::error::OutlierError;
use crate::metrics::median_in_place;

/// Median, MAD and resulting threshold of one metric column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MadStatistics {
    /// Median of the column
    pub median: f64,
    /// Median absolute deviation from `median`
    pub mad: f64,
    /// `mad * scale_factor + median`
    pub threshold: f64,
}

/// Compute median, MAD and threshold of one set of values
///
/// # Arguments
///
/// * `values` - Metric values of one keypoint (or keypoint pair) over frames
/// * `scale_factor` - MAD multiplier (caller-chosen, typically 4.0-12.0)
///
/// # Errors
///
/// - `InsufficientData` if there are fewer than [`MIN_METRIC_ROWS`] values
/// - `InvalidConfig` if `scale_factor` is negative or non-finite
///
/// # Example
///
/// ```
/// use keypoint_outliers::detection::threshold::median_mad_threshold;
///
/// let stats = median_mad_threshold(&[1.0, 2.0, 3.0, 4.0, 100.0], 4.0)?;
/// assert_eq!(stats.median, 3.0);
/// assert_eq!(stats.mad, 1.0);
/// assert_eq!(stats.threshold, 7.0);
/// # Ok::<(), keypoint_outliers::OutlierError>(())
/// ```
pub fn median_mad_threshold(values: &[f64], scale_factor: f64) -> Result<MadStatistics, OutlierError> {
    validate_scale_factor(scale_factor)?;

    if values.len() < MIN_METRIC_ROWS {
        return Err(OutlierError::InsufficientData(format!(
            "MAD threshold needs at least {} values, got {}",
            MIN_METRIC_ROWS,
            values.len()
        )));
    }

    let mut scratch = values.to_vec();
    Ok(mad_statistics(&mut scratch, scale_factor))
}

/// Median/MAD of `scratch`, which is reused as working storage
fn mad_statistics(scratch: &mut [f64], scale_factor: f64) -> MadStatistics {
    // Step 1: median
    let median = median_in_place(scratch);

    // Step 2: MAD = median(|v - median|)
    for v in scratch.iter_mut() {
        *v = (*v - median).abs();
    }
    let mad = median_in_place(scratch);

    // Step 3: threshold
    MadStatistics {
        median,
        mad,
        threshold: mad * scale_factor + median,
    }
}

/// Compute one MAD threshold per column of a metric array (rows = frames)
///
/// # Errors
///
/// - `InsufficientData` if the array has fewer than [`MIN_METRIC_ROWS`] rows
/// - `InvalidConfig` if `scale_factor` is negative or non-finite
pub fn column_thresholds(
    metric: ArrayView2<f64>,
    scale_factor: f64,
) -> Result<Array1<f64>, OutlierError> {
    validate_scale_factor(scale_factor)?;

    let (n_rows, n_columns) = metric.dim();
    if n_rows < MIN_METRIC_ROWS {
        return Err(OutlierError::InsufficientData(format!(
            "MAD threshold needs at least {} rows, got {}",
            MIN_METRIC_ROWS, n_rows
        )));
    }

    let mut thresholds = Array1::zeros(n_columns);
    let mut scratch = Vec::with_capacity(n_rows);
    let mut zero_mad_columns = 0usize;

    for (column, threshold) in metric.axis_iter(Axis(1)).zip(thresholds.iter_mut()) {
        scratch.clear();
        scratch.extend(column.iter().copied());
        let stats = mad_statistics(&mut scratch, scale_factor);
        if stats.mad == 0.0 {
            zero_mad_columns += 1;
        }
        *threshold = stats.threshold;
    }

    if zero_mad_columns > 0 {
        log::warn!(
            "{} of {} columns have zero MAD; any value above their median will be flagged",
            zero_mad_columns,
            n_columns
        );
    }

    Ok(thresholds)
}

/// Flag entries strictly greater than their column's threshold
///
/// `thresholds` must have one entry per column of `metric`.
pub fn exceeds_thresholds(metric: ArrayView2<f64>, thresholds: ArrayView1<f64>) -> Array2<bool> {
    debug_assert_eq!(metric.ncols(), thresholds.len());

    let mut mask = Array2::from_elem(metric.dim(), false);
    Zip::from(&mut mask)
        .and(&metric)
        .and_broadcast(&thresholds)
        .for_each(|flag, &value, &threshold| *flag = value > threshold);
    mask
}
