//! Classification strategies, breakpoints and class assignment
//!
//! This module turns a numeric sample into ordered classes for choropleth
//! shading. Every operation is pure: outputs are recomputed on each call and
//! nothing is cached between calls.

mod assign;
mod breaks;
mod natural;
mod sample;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{MapclassError, Result};

pub use assign::{assign, assign_closed, assign_with_oob};
pub use breaks::equal_width_breaks;

pub(crate) use assign::validate_breaks;

use sample::{sum_squared_deviations, SortedSample};

/// Default number of classes
pub const DEFAULT_CLASS_COUNT: usize = 5;

// =============================================================================
// Option Enums
// =============================================================================

/// How breakpoints are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// `k` intervals of equal width between the minimum and maximum
    EqualWidth,
    /// Equal element counts per class
    Quantile,
    /// Jenks optimal partition minimizing within-class variance
    NaturalBreaks,
}

impl Strategy {
    /// All strategies, in documentation order
    pub const ALL: [Strategy; 3] = [
        Strategy::EqualWidth,
        Strategy::Quantile,
        Strategy::NaturalBreaks,
    ];

    /// Canonical name for parsing and display
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::EqualWidth => "equal-width",
            Strategy::Quantile => "quantile",
            Strategy::NaturalBreaks => "natural-breaks",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Strategy {
    type Err = MapclassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "equal-width" | "equal" | "equal-interval" => Ok(Strategy::EqualWidth),
            "quantile" | "quantiles" | "equal-count" => Ok(Strategy::Quantile),
            "natural-breaks" | "natural" | "jenks" | "fisher" => Ok(Strategy::NaturalBreaks),
            other => Err(MapclassError::InvalidArgument(format!(
                "Unknown strategy '{}'. Must be one of: equal-width, quantile, natural-breaks",
                other
            ))),
        }
    }
}

/// Which end of each interval includes its breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Closed {
    /// `[lower, upper)`; the last class also includes its upper bound
    #[default]
    Left,
    /// `(lower, upper]`; the first class also includes its lower bound
    Right,
}

impl std::fmt::Display for Closed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Closed::Left => "left",
            Closed::Right => "right",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Closed {
    type Err = MapclassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(Closed::Left),
            "right" => Ok(Closed::Right),
            other => Err(MapclassError::InvalidArgument(format!(
                "Invalid closed value '{}'. Must be 'left' or 'right'",
                other
            ))),
        }
    }
}

/// What to do when more classes are requested than the sample has distinct values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassCountPolicy {
    /// Fail with [`MapclassError::InvalidArgument`]
    #[default]
    Strict,
    /// Lower the class count to the number of distinct values
    Cap,
}

impl std::fmt::Display for ClassCountPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClassCountPolicy::Strict => "strict",
            ClassCountPolicy::Cap => "cap",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ClassCountPolicy {
    type Err = MapclassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ClassCountPolicy::Strict),
            "cap" => Ok(ClassCountPolicy::Cap),
            other => Err(MapclassError::InvalidArgument(format!(
                "Invalid class count policy '{}'. Must be 'strict' or 'cap'",
                other
            ))),
        }
    }
}

/// Out-of-bounds handling for values outside `[b_0, b_k]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Oob {
    /// Report [`MapclassError::OutOfRange`]
    #[default]
    Error,
    /// Drop the value (no class)
    Censor,
    /// Clamp to the nearest end class
    Squish,
}

impl std::fmt::Display for Oob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Oob::Error => "error",
            Oob::Censor => "censor",
            Oob::Squish => "squish",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Oob {
    type Err = MapclassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Oob::Error),
            "censor" => Ok(Oob::Censor),
            "squish" => Ok(Oob::Squish),
            other => Err(MapclassError::InvalidArgument(format!(
                "Invalid oob value '{}'. Must be 'error', 'censor', or 'squish'",
                other
            ))),
        }
    }
}

/// Options shared by [`compute_breaks_with`] and [`classify`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyOptions {
    pub closed: Closed,
    pub class_count_policy: ClassCountPolicy,
}

// =============================================================================
// Break Computation
// =============================================================================

/// Compute `k + 1` breakpoints for `sample` with left-closed intervals.
///
/// `breaks[0]` is the sample minimum and `breaks[k]` the maximum. Fails with
/// [`MapclassError::InvalidArgument`] for an empty sample, non-finite values,
/// `k == 0`, or `k` above the number of distinct values.
pub fn compute_breaks(sample: &[f64], k: usize, strategy: Strategy) -> Result<Vec<f64>> {
    compute_breaks_with(sample, k, strategy, &ClassifyOptions::default())
}

/// Compute breakpoints with explicit options.
pub fn compute_breaks_with(
    sample: &[f64],
    k: usize,
    strategy: Strategy,
    options: &ClassifyOptions,
) -> Result<Vec<f64>> {
    let sorted = SortedSample::new(sample)?;
    let k = effective_class_count(&sorted, k, options.class_count_policy)?;
    tracing::debug!(
        strategy = %strategy,
        n = sorted.len(),
        distinct = sorted.distinct_count(),
        classes = k,
        "computing breaks"
    );
    Ok(breaks_for(&sorted, k, strategy, options.closed))
}

fn breaks_for(sorted: &SortedSample, k: usize, strategy: Strategy, closed: Closed) -> Vec<f64> {
    match strategy {
        Strategy::EqualWidth => equal_width_breaks(sorted.min(), sorted.max(), k),
        Strategy::Quantile => breaks::quantile_breaks(sorted, k, closed),
        Strategy::NaturalBreaks => natural::natural_breaks(sorted, k, closed),
    }
}

/// Validate `k` against the sample, applying the class count policy.
fn effective_class_count(
    sorted: &SortedSample,
    k: usize,
    policy: ClassCountPolicy,
) -> Result<usize> {
    if k == 0 {
        return Err(MapclassError::InvalidArgument(
            "class count must be at least 1".to_string(),
        ));
    }

    let distinct = sorted.distinct_count();
    if k <= distinct {
        return Ok(k);
    }

    match policy {
        ClassCountPolicy::Strict => Err(MapclassError::InvalidArgument(format!(
            "cannot form {} classes from {} distinct value(s)",
            k, distinct
        ))),
        ClassCountPolicy::Cap => {
            tracing::warn!(
                requested = k,
                capped = distinct,
                "class count exceeds distinct values, capping"
            );
            Ok(distinct)
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Breakpoints and per-position class assignments for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    strategy: Strategy,
    closed: Closed,
    requested_classes: usize,
    breaks: Vec<f64>,
    assignments: Vec<usize>,
    class_ranges: Vec<Option<(f64, f64)>>,
    goodness_of_variance_fit: f64,
}

impl Classification {
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn closed(&self) -> Closed {
        self.closed
    }

    /// Number of classes actually produced
    pub fn classes(&self) -> usize {
        self.breaks.len() - 1
    }

    /// Number of classes asked for (differs from [`Self::classes`] only when capped)
    pub fn requested_classes(&self) -> usize {
        self.requested_classes
    }

    pub fn was_capped(&self) -> bool {
        self.requested_classes != self.classes()
    }

    pub fn breaks(&self) -> &[f64] {
        &self.breaks
    }

    /// Class index for each sample position, in input order
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Number of sample values in each class
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes()];
        for &class in &self.assignments {
            counts[class] += 1;
        }
        counts
    }

    /// Observed `(min, max)` of the values in each class; `None` for empty classes
    pub fn class_ranges(&self) -> &[Option<(f64, f64)>] {
        &self.class_ranges
    }

    /// `1 - SDCM / SDAM`: 1.0 means no variance is left inside classes
    pub fn goodness_of_variance_fit(&self) -> f64 {
        self.goodness_of_variance_fit
    }
}

/// Compute breakpoints and assign every sample value to a class.
///
/// Equal-width and natural-breaks assignments follow [`assign_closed`] with
/// `options.closed`. Quantile assignments are rank-based: equal values that
/// straddle a class boundary are split by input position so class sizes stay
/// balanced to within one element.
pub fn classify(
    sample: &[f64],
    k: usize,
    strategy: Strategy,
    options: &ClassifyOptions,
) -> Result<Classification> {
    let sorted = SortedSample::new(sample)?;
    let classes = effective_class_count(&sorted, k, options.class_count_policy)?;
    tracing::debug!(
        strategy = %strategy,
        n = sorted.len(),
        distinct = sorted.distinct_count(),
        classes,
        "classifying sample"
    );

    let breaks = breaks_for(&sorted, classes, strategy, options.closed);
    let assignments = match strategy {
        Strategy::Quantile => breaks::quantile_assignments(&sorted, classes),
        Strategy::EqualWidth | Strategy::NaturalBreaks => sample
            .iter()
            .map(|&v| assign::locate(v, &breaks, options.closed))
            .collect(),
    };

    let mut members: Vec<Vec<f64>> = vec![Vec::new(); classes];
    for (&value, &class) in sample.iter().zip(&assignments) {
        members[class].push(value);
    }

    let class_ranges = members
        .iter()
        .map(|values| {
            let min = values.iter().copied().reduce(f64::min)?;
            let max = values.iter().copied().reduce(f64::max)?;
            Some((min, max))
        })
        .collect();

    // The fit is a ratio, so normalize first to keep squared deviations finite
    let scale = sample
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(f64::MIN_POSITIVE);
    let scaled_ssd = |values: &[f64]| {
        let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
        sum_squared_deviations(&scaled)
    };
    let sdam = scaled_ssd(sample);
    let sdcm: f64 = members.iter().map(|v| scaled_ssd(v)).sum();
    let goodness_of_variance_fit = if sdam > 0.0 {
        (1.0 - sdcm / sdam).clamp(0.0, 1.0)
    } else {
        1.0
    };

    Ok(Classification {
        strategy,
        closed: options.closed,
        requested_classes: k,
        breaks,
        assignments,
        class_ranges,
        goodness_of_variance_fit,
    })
}
