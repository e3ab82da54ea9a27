use crate::{Error, Result, F};

/// Accept `q` only inside `[0, 1)`.
pub fn check_quantile(q: F) -> Result<F> {
    if (0.0..1.0).contains(&q) {
        Ok(q)
    } else {
        Err(Error::QuantileOutOfRange(q))
    }
}

/// Empirical `q` quantile of an unordered, non-empty sample.
///
/// Sorts a copy of `values` and interpolates linearly between the order
/// statistics around rank `q * (n - 1)`, so integral ranks return an exact
/// sample value and `q = 0` returns the minimum.
pub fn empirical_quantile(values: &[F], q: F) -> Result<F> {
    let q = check_quantile(q)?;
    if values.is_empty() {
        return Err(Error::EmptySample);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(F::total_cmp);
    Ok(quantile_of_sorted(&sorted, q))
}

/// Quantile of an ascending, non-empty sample with `q` already checked.
pub(crate) fn quantile_of_sorted(sorted: &[F], q: F) -> F {
    debug_assert!(!sorted.is_empty());
    let rank = q * (sorted.len() - 1) as F;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as F;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
