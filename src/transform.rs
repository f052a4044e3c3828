//! Input transform applied to reflectivity curves before they reach the network.
//!
//! Reflectivity spans many decades; the natural log compresses that range.

use crate::data::Matrix;
use crate::{Error, Result};

/// Element-wise natural logarithm.
///
/// Every entry must be finite and strictly positive. The first offending entry
/// (`<= 0`, infinite or NaN) is reported as [`Error::NumericDomain`] and nothing
/// is computed.
pub fn log_transform(curves: &Matrix) -> Result<Matrix> {
    let cols = curves.cols();
    if let Some(idx) = curves
        .as_slice()
        .iter()
        .position(|&v| !(v > 0.0 && v.is_finite()))
    {
        let (row, col) = (idx / cols, idx % cols);
        return Err(Error::NumericDomain(format!(
            "reflectivity must be finite and > 0 for the log transform, got {} at curve {row}, sample {col}",
            curves.get(row, col)
        )));
    }
    Ok(curves.map(f64::ln))
}
