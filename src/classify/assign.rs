//! Class assignment against a set of breakpoints

use super::{Closed, Oob};
use crate::{MapclassError, Result};

/// Check that `breaks` describes at least one class: two or more finite,
/// non-decreasing values.
pub(crate) fn validate_breaks(breaks: &[f64]) -> Result<()> {
    if breaks.len() < 2 {
        return Err(MapclassError::InvalidArgument(format!(
            "breakpoints need at least 2 values to define a class, got {}",
            breaks.len()
        )));
    }
    if let Some(value) = breaks.iter().find(|b| !b.is_finite()) {
        return Err(MapclassError::InvalidArgument(format!(
            "breakpoint {} is not finite",
            value
        )));
    }
    if let Some(pair) = breaks.windows(2).find(|w| w[1] < w[0]) {
        return Err(MapclassError::InvalidArgument(format!(
            "breakpoints must be non-decreasing, found {} after {}",
            pair[1], pair[0]
        )));
    }
    Ok(())
}

/// Assign `value` to a class using left-closed intervals.
///
/// Classes are `[b_i, b_{i+1})`, except the last which is `[b_{k-1}, b_k]` so
/// the maximum is always included. Fails with [`MapclassError::OutOfRange`]
/// when `value` lies outside `[b_0, b_k]`.
pub fn assign(value: f64, breaks: &[f64]) -> Result<usize> {
    assign_closed(value, breaks, Closed::Left)
}

/// Assign `value` to a class with the given closed side.
///
/// - `Closed::Left`: `[lower, upper)`, last class `[lower, upper]`
/// - `Closed::Right`: `(lower, upper]`, first class `[lower, upper]`
///
/// Repeated breakpoints create empty intervals. A value equal to a repeated
/// breakpoint goes to the last class that contains it for `Left`, and the
/// first for `Right`.
pub fn assign_closed(value: f64, breaks: &[f64], closed: Closed) -> Result<usize> {
    validate_breaks(breaks)?;
    if value.is_nan() {
        return Err(MapclassError::InvalidArgument(
            "cannot assign NaN to a class".to_string(),
        ));
    }

    let lower = breaks[0];
    let upper = breaks[breaks.len() - 1];
    if value < lower || value > upper {
        return Err(MapclassError::OutOfRange {
            value,
            lower,
            upper,
        });
    }

    Ok(locate(value, breaks, closed))
}

/// Assign `value` with an out-of-bounds policy.
///
/// Returns `Ok(None)` only for [`Oob::Censor`] when the value falls outside
/// the breakpoints.
pub fn assign_with_oob(
    value: f64,
    breaks: &[f64],
    closed: Closed,
    oob: Oob,
) -> Result<Option<usize>> {
    match assign_closed(value, breaks, closed) {
        Ok(class) => Ok(Some(class)),
        Err(MapclassError::OutOfRange { value, lower, upper }) => match oob {
            Oob::Error => Err(MapclassError::OutOfRange {
                value,
                lower,
                upper,
            }),
            Oob::Censor => Ok(None),
            Oob::Squish => {
                let clamped = value.clamp(lower, upper);
                Ok(Some(locate(clamped, breaks, closed)))
            }
        },
        Err(e) => Err(e),
    }
}

/// Class index for an in-range value. `breaks` must already be validated.
pub(crate) fn locate(value: f64, breaks: &[f64], closed: Closed) -> usize {
    let classes = breaks.len() - 1;
    match closed {
        Closed::Left => {
            // Number of interior breaks at or below value
            breaks[1..classes].partition_point(|&b| b <= value)
        }
        Closed::Right => {
            // Number of interior breaks strictly below value
            breaks[1..classes].partition_point(|&b| b < value)
        }
    }
}
