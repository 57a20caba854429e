//! Break calculation for the equal-width and quantile strategies
//!
//! Natural breaks live in [`super::natural`]; all three share the convention
//! that `breaks[0]` is the sample minimum and `breaks[k]` the sample maximum.

use super::sample::SortedSample;
use super::Closed;

// =============================================================================
// Equal Width
// =============================================================================

/// Divide `[min, max]` into `k` equal-width intervals.
///
/// Produces exactly `k + 1` breaks, with the last pinned to `max` so that
/// accumulated floating-point error never leaves the maximum outside the
/// final class.
///
/// When `max - min` overflows `f64` the breaks are interpolated as
/// `min * (1 - t) + max * t`, whose terms stay finite.
pub fn equal_width_breaks(min: f64, max: f64, k: usize) -> Vec<f64> {
    if k == 0 {
        return vec![];
    }

    let width = (max - min) / k as f64;
    let mut breaks: Vec<f64> = Vec::with_capacity(k + 1);
    breaks.push(min);
    for i in 1..k {
        let value = if width.is_finite() {
            min + width * i as f64
        } else {
            let t = i as f64 / k as f64;
            min * (1.0 - t) + max * t
        };
        breaks.push(value);
    }
    breaks.push(max);
    breaks
}

// =============================================================================
// Quantile
// =============================================================================

/// Rank positions where each quantile class starts.
///
/// Returns `k + 1` positions `p_0 = 0 <= p_1 <= ... <= p_k = n`; class `i`
/// holds sorted ranks `p_i..p_{i+1}`.
pub(crate) fn quantile_positions(n: usize, k: usize) -> Vec<usize> {
    (0..=k).map(|i| i * n / k).collect()
}

/// Breaks for quantile classification.
///
/// With `Closed::Left` each interior break is the smallest member of the class
/// it opens; with `Closed::Right` it is the largest member of the class it closes.
pub(crate) fn quantile_breaks(sorted: &SortedSample, k: usize, closed: Closed) -> Vec<f64> {
    let n = sorted.len();
    let positions = quantile_positions(n, k);

    let mut breaks = Vec::with_capacity(k + 1);
    breaks.push(sorted.min());
    for &p in &positions[1..k] {
        let value = match closed {
            Closed::Left => sorted.values[p],
            Closed::Right => sorted.values[p - 1],
        };
        breaks.push(value);
    }
    breaks.push(sorted.max());
    breaks
}

/// Class index for each input position under rank-based quantile assignment.
///
/// Ties crossing a class boundary are split by input position, which keeps
/// class sizes balanced to within one element.
pub(crate) fn quantile_assignments(sorted: &SortedSample, k: usize) -> Vec<usize> {
    let positions = quantile_positions(sorted.len(), k);
    let mut assignments = vec![0; sorted.len()];

    for class in 0..k {
        for rank in positions[class]..positions[class + 1] {
            assignments[sorted.order[rank]] = class;
        }
    }
    assignments
}
