use crate::error::{AnalysisError, Result};
use crate::models::DenseSeries;

/// Pearson product-moment correlation of two aligned dense series.
///
/// Returns `NaN` when either series is constant. Callers must resample
/// both sides to the same horizon first; anything else is a length mismatch.
pub fn pearson(a: &DenseSeries, b: &DenseSeries) -> Result<f64> {
    pearson_slices(a.values(), b.values())
}

/// Decided on the raw values: a float mean of a constant like 0.7 is off by
/// an ulp, which leaves a tiny nonzero variance.
fn is_constant(values: &[f64]) -> bool {
    match values.split_first() {
        Some((first, rest)) => rest.iter().all(|v| v == first),
        None => true,
    }
}

pub(crate) fn pearson_slices(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(AnalysisError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if is_constant(a) || is_constant(b) {
        return Ok(f64::NAN);
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Ok(f64::NAN);
    }

    // Rounding can push |r| a hair past 1.
    Ok((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}
