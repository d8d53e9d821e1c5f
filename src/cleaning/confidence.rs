//! Confidence rewriting for interpolated entries

use ndarray::{Array2, ArrayView2, Zip};

use crate::error::OutlierError;

/// Copy `confidences` with every masked entry set to exactly 0
///
/// A zero confidence tells downstream consumers that the position at that
/// entry is synthetic, whatever the tracker originally reported.
///
/// # Errors
///
/// `ShapeMismatch` if `mask` and `confidences` differ in shape
pub fn zero_masked_confidences(
    confidences: ArrayView2<f64>,
    mask: ArrayView2<bool>,
) -> Result<Array2<f64>, OutlierError> {
    if confidences.dim() != mask.dim() {
        return Err(OutlierError::ShapeMismatch(format!(
            "confidences are {:?} but mask is {:?}",
            confidences.dim(),
            mask.dim()
        )));
    }

    let mut rewritten = confidences.to_owned();
    Zip::from(&mut rewritten).and(&mask).for_each(|c, &masked| {
        if masked {
            *c = 0.0;
        }
    });

    Ok(rewritten)
}
