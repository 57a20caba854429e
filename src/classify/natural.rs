//! Jenks natural breaks
//!
//! Optimal univariate partition minimizing the total within-class sum of
//! squared deviations (Fisher 1958, Jenks 1967). The dynamic program runs over
//! the distinct sorted values weighted by multiplicity, so a run of equal
//! values is never split between classes.
//!
//! `cost[c][i]` is the smallest total SSD for the first `i` runs split into
//! `c` classes:
//!
//! ```text
//! cost[1][i] = SSD(0..i)
//! cost[c][i] = min_{c-1 <= j < i} cost[c-1][j] + SSD(j..i)
//! ```
//!
//! Segment SSD comes from prefix sums in O(1), giving O(m²k) overall for `m`
//! distinct values.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::sample::{Run, SegmentStats, SortedSample};
use super::Closed;

/// Minimum number of cells in a DP column before it is filled in parallel
#[cfg(feature = "parallel")]
const PARALLEL_MIN_CELLS: usize = 256;

/// Find the first run index of each class in the optimal `k`-partition.
///
/// The returned vector has length `k` and always starts with 0. Among equally
/// good split points the smallest wins, which makes the result deterministic.
/// `k` must be in `1..=runs.len()`.
pub(crate) fn jenks_partition(runs: &[Run], k: usize) -> Vec<usize> {
    let m = runs.len();
    debug_assert!(k >= 1 && k <= m);

    let stats = SegmentStats::from_runs(runs);
    tracing::debug!(distinct = m, classes = k, "natural breaks dynamic program");

    // Column for c = 1
    let mut prev: Vec<f64> = (0..=m).map(|i| stats.ssd(0, i)).collect();
    // splits[c - 2][i]: start run of the last class in the best (c, i) solution
    let mut splits: Vec<Vec<usize>> = Vec::with_capacity(k.saturating_sub(1));

    for c in 2..=k {
        // The final column only needs the full-sample cell
        let first = if c == k { m } else { c };
        let cells = fill_column(&prev, &stats, c, first, m);

        let mut next = vec![f64::INFINITY; m + 1];
        let mut split = vec![0; m + 1];
        for (offset, (cost, j)) in cells.into_iter().enumerate() {
            next[first + offset] = cost;
            split[first + offset] = j;
        }

        prev = next;
        splits.push(split);
    }

    // Backtrack from the full sample
    let mut starts = vec![0; k];
    let mut end = m;
    for c in (2..=k).rev() {
        let j = splits[c - 2][end];
        starts[c - 1] = j;
        end = j;
    }
    starts
}

/// Best `(cost, split)` for every `i` in `first..=last` of column `c`.
#[cfg(feature = "parallel")]
fn fill_column(
    prev: &[f64],
    stats: &SegmentStats,
    c: usize,
    first: usize,
    last: usize,
) -> Vec<(f64, usize)> {
    if last + 1 - first >= PARALLEL_MIN_CELLS {
        (first..=last)
            .into_par_iter()
            .map(|i| best_split(prev, stats, c, i))
            .collect()
    } else {
        (first..=last)
            .map(|i| best_split(prev, stats, c, i))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn fill_column(
    prev: &[f64],
    stats: &SegmentStats,
    c: usize,
    first: usize,
    last: usize,
) -> Vec<(f64, usize)> {
    (first..=last)
        .map(|i| best_split(prev, stats, c, i))
        .collect()
}

fn best_split(prev: &[f64], stats: &SegmentStats, c: usize, i: usize) -> (f64, usize) {
    let mut best_cost = f64::INFINITY;
    let mut best_j = c - 1;
    for j in (c - 1)..i {
        let cost = prev[j] + stats.ssd(j, i);
        if cost < best_cost {
            best_cost = cost;
            best_j = j;
        }
    }
    (best_cost, best_j)
}

/// Natural breaks for a validated sample.
///
/// With `Closed::Left`, each interior break is the first value of the class it
/// opens. With `Closed::Right`, it is the last value of the class it closes,
/// which matches the upper-bound convention of the usual Jenks references.
pub(crate) fn natural_breaks(sorted: &SortedSample, k: usize, closed: Closed) -> Vec<f64> {
    let runs = &sorted.runs;
    let starts = jenks_partition(runs, k);

    let mut breaks = Vec::with_capacity(k + 1);
    breaks.push(sorted.min());
    for &start in &starts[1..] {
        let value = match closed {
            Closed::Left => runs[start].value,
            Closed::Right => runs[start - 1].value,
        };
        breaks.push(value);
    }
    breaks.push(sorted.max());
    breaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::sample::{distinct_runs, sum_squared_deviations};

    /// Total SSD of a partition given by class start indices over `values`
    fn partition_cost(values: &[f64], starts: &[usize]) -> f64 {
        let mut bounds = starts.to_vec();
        bounds.push(values.len());
        bounds
            .windows(2)
            .map(|w| sum_squared_deviations(&values[w[0]..w[1]]))
            .sum()
    }

    /// Enumerate every way to cut `n` ordered values into `k` non-empty classes.
    fn all_partitions(n: usize, k: usize) -> Vec<Vec<usize>> {
        fn recurse(n: usize, k: usize, starts: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            if starts.len() == k {
                out.push(starts.clone());
                return;
            }
            let last = *starts.last().unwrap();
            let remaining = k - starts.len();
            for next in (last + 1)..=(n - remaining) {
                starts.push(next);
                recurse(n, k, starts, out);
                starts.pop();
            }
        }
        let mut out = Vec::new();
        recurse(n, k, &mut vec![0], &mut out);
        out
    }

    fn runs_of(values: &[f64]) -> Vec<Run> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        distinct_runs(&sorted)
    }

    // =========================================================================
    // Partition Tests
    // =========================================================================

    #[test]
    fn test_obvious_clusters() {
        let values = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 20.0, 21.0, 22.0];
        let runs = runs_of(&values);
        assert_eq!(jenks_partition(&runs, 3), vec![0, 3, 6]);

        let sorted = SortedSample::new(&values).unwrap();
        assert_eq!(
            natural_breaks(&sorted, 3, Closed::Left),
            vec![1.0, 10.0, 20.0, 22.0]
        );
        assert_eq!(
            natural_breaks(&sorted, 3, Closed::Right),
            vec![1.0, 3.0, 12.0, 22.0]
        );
    }

    #[test]
    fn test_matches_published_jenks_breaks() {
        // Worked example from the jenkspy README (class upper bounds)
        let values = [
            1.3, 7.1, 7.3, 2.3, 3.9, 4.1, 7.8, 1.2, 4.3, 7.3, 5.0, 4.3,
        ];
        let sorted = SortedSample::new(&values).unwrap();
        assert_eq!(
            natural_breaks(&sorted, 3, Closed::Right),
            vec![1.2, 2.3, 5.0, 7.8]
        );
        assert_eq!(
            natural_breaks(&sorted, 3, Closed::Left),
            vec![1.2, 3.9, 7.1, 7.8]
        );
    }

    #[test]
    fn test_single_class_and_one_class_per_value() {
        let values = [4.0, 8.0, 15.0, 16.0, 23.0, 42.0];
        let runs = runs_of(&values);
        assert_eq!(jenks_partition(&runs, 1), vec![0]);
        assert_eq!(jenks_partition(&runs, 6), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_ties_are_never_split() {
        // Five copies of 5.0 sit between two groups
        let values = [1.0, 1.0, 5.0, 5.0, 5.0, 5.0, 5.0, 9.0, 9.0];
        let sorted = SortedSample::new(&values).unwrap();
        assert_eq!(sorted.distinct_count(), 3);
        assert_eq!(
            natural_breaks(&sorted, 2, Closed::Left).len(),
            3,
            "two classes need three breaks"
        );
        assert_eq!(jenks_partition(&sorted.runs, 3), vec![0, 1, 2]);
    }

    #[test]
    fn test_weighted_runs_pull_the_split() {
        // Many copies of 10 make {0, 10...} costlier than isolating 0
        let values = [0.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 14.0];
        let sorted = SortedSample::new(&values).unwrap();
        let breaks = natural_breaks(&sorted, 2, Closed::Left);
        assert_eq!(breaks, vec![0.0, 10.0, 14.0]);
    }

    #[test]
    fn test_partition_is_optimal_against_brute_force() {
        let samples: Vec<Vec<f64>> = vec![
            vec![5.0, 12.0, 18.0, 25.0, 31.0, 47.0, 52.0, 61.0, 73.0, 88.0],
            vec![0.3, 0.9, 1.1, 2.8, 3.0, 3.3, 7.5, 7.9, 8.0, 8.1, 12.0, 19.5],
            vec![-4.0, -3.5, -1.0, 0.0, 0.5, 2.25, 6.0, 6.5],
            vec![100.0, 101.0, 103.0, 150.0, 151.0, 400.0, 401.0],
        ];
        for values in samples {
            let runs = runs_of(&values);
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for k in 1..=values.len().min(6) {
                let ours = partition_cost(&sorted, &jenks_partition(&runs, k));
                let brute = all_partitions(sorted.len(), k)
                    .iter()
                    .map(|starts| partition_cost(&sorted, starts))
                    .fold(f64::INFINITY, f64::min);
                assert!(
                    ours <= brute + 1e-9 * brute.max(1.0),
                    "k={} on {:?}: ours {} vs brute force {}",
                    k,
                    values,
                    ours,
                    brute
                );
            }
        }
    }

    #[test]
    fn test_smallest_split_wins_on_exact_tie() {
        // Symmetric sample: {0} | {1, 2} and {0, 1} | {2} cost the same
        let runs = runs_of(&[0.0, 1.0, 2.0]);
        assert_eq!(jenks_partition(&runs, 2), vec![0, 1]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_column_matches_sequential() {
        // Enough distinct values to cross the parallel threshold
        let values: Vec<f64> = (0..600)
            .map(|i| ((i * 37) % 600) as f64 + (i % 7) as f64 * 0.1)
            .collect();
        let runs = runs_of(&values);
        let stats = SegmentStats::from_runs(&runs);
        let m = runs.len();
        let prev: Vec<f64> = (0..=m).map(|i| stats.ssd(0, i)).collect();

        let parallel = fill_column(&prev, &stats, 2, 2, m);
        let sequential: Vec<(f64, usize)> =
            (2..=m).map(|i| best_split(&prev, &stats, 2, i)).collect();
        assert_eq!(parallel, sequential);
    }
}
