//! Sample validation, ordering and prefix-sum statistics

use std::cmp::Ordering;

use crate::{MapclassError, Result};

/// A run of equal values in the sorted sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Run {
    pub value: f64,
    pub count: usize,
}

/// A validated sample in ascending order.
///
/// Ties keep their input order, so `order` is reproducible for identical input.
#[derive(Debug, Clone)]
pub(crate) struct SortedSample {
    /// Input positions in ascending value order
    pub order: Vec<usize>,
    /// Sample values in ascending order
    pub values: Vec<f64>,
    /// Distinct values with their multiplicities
    pub runs: Vec<Run>,
}

impl SortedSample {
    pub fn new(sample: &[f64]) -> Result<Self> {
        validate(sample)?;

        let mut order: Vec<usize> = (0..sample.len()).collect();
        // sort_by is stable: equal values stay in input order
        order.sort_by(|&a, &b| compare(sample[a], sample[b]));

        let values: Vec<f64> = order.iter().map(|&i| sample[i]).collect();
        let runs = distinct_runs(&values);

        Ok(Self {
            order,
            values,
            runs,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn min(&self) -> f64 {
        self.values[0]
    }

    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    pub fn distinct_count(&self) -> usize {
        self.runs.len()
    }
}

/// Reject empty samples and non-finite values.
pub(crate) fn validate(sample: &[f64]) -> Result<()> {
    if sample.is_empty() {
        return Err(MapclassError::InvalidArgument(
            "sample is empty".to_string(),
        ));
    }
    if let Some((position, value)) = sample.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(MapclassError::InvalidArgument(format!(
            "sample value at position {} is not finite ({})",
            position, value
        )));
    }
    Ok(())
}

/// Total order for finite values (`-0.0` and `0.0` compare equal)
pub(crate) fn compare(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Collapse a sorted slice into runs of equal values.
pub(crate) fn distinct_runs(sorted: &[f64]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for &value in sorted {
        match runs.last_mut() {
            Some(run) if run.value == value => run.count += 1,
            _ => runs.push(Run { value, count: 1 }),
        }
    }
    runs
}

/// Sum of squared deviations from the mean (two-pass).
pub(crate) fn sum_squared_deviations(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean) * (v - mean)).sum()
}

// =============================================================================
// Prefix-sum segment statistics
// =============================================================================

/// Weighted prefix sums for O(1) sum-of-squared-deviation queries over
/// contiguous runs.
///
/// Values are shifted by the weighted mean before accumulating so that the
/// `S2 - S1²/w` difference does not cancel catastrophically for data far from zero.
#[derive(Debug, Clone)]
pub(crate) struct SegmentStats {
    weight: Vec<f64>,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl SegmentStats {
    pub fn from_runs(runs: &[Run]) -> Self {
        let total_weight: f64 = runs.iter().map(|r| r.count as f64).sum();
        let shift = if total_weight > 0.0 {
            runs.iter().map(|r| r.value * r.count as f64).sum::<f64>() / total_weight
        } else {
            0.0
        };

        let mut weight = Vec::with_capacity(runs.len() + 1);
        let mut sum = Vec::with_capacity(runs.len() + 1);
        let mut sum_sq = Vec::with_capacity(runs.len() + 1);
        weight.push(0.0);
        sum.push(0.0);
        sum_sq.push(0.0);

        for (i, run) in runs.iter().enumerate() {
            let w = run.count as f64;
            let x = run.value - shift;
            weight.push(weight[i] + w);
            sum.push(sum[i] + w * x);
            sum_sq.push(sum_sq[i] + w * x * x);
        }

        Self {
            weight,
            sum,
            sum_sq,
        }
    }

    /// Number of runs covered
    pub fn len(&self) -> usize {
        self.weight.len() - 1
    }

    /// Sum of squared deviations of runs `start..end` (half-open).
    pub fn ssd(&self, start: usize, end: usize) -> f64 {
        debug_assert!(start <= end && end <= self.len());
        let w = self.weight[end] - self.weight[start];
        if w <= 0.0 {
            return 0.0;
        }
        let s = self.sum[end] - self.sum[start];
        let s2 = self.sum_sq[end] - self.sum_sq[start];
        (s2 - s * s / w).max(0.0)
    }
}
