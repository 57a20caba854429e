/*!
# mapclass - Interval classification for choropleth maps

Bins a numeric attribute (one value per geographic area) into ordered classes so each
class can be shaded with its own colour.

## Example

```
use mapclass::{compute_breaks, assign, format_labels, Strategy};

let sample = [5.0, 12.0, 18.0, 25.0, 31.0, 47.0, 52.0, 61.0, 73.0, 88.0];
let breaks = compute_breaks(&sample, 5, Strategy::EqualWidth).unwrap();
assert_eq!(breaks.len(), 6);
assert_eq!(assign(88.0, &breaks).unwrap(), 4);

let labels = format_labels(&breaks, 1).unwrap();
assert_eq!(labels[0], "5.0 to 21.6");
```

## Architecture

Classification is split into three stateless steps:
- **Breaks** → [`compute_breaks`] derives `k + 1` breakpoints with one of the [`Strategy`] variants
- **Assignment** → [`assign`] maps a value to its class index under a [`Closed`] side rule
- **Labels** → [`format_labels`] renders one legend label per class

[`classify()`] runs breaks and assignment together and returns a [`Classification`].

## Core Components

- [`mod@classify`] - Strategies, breakpoints, class assignment
- [`format`] - Legend label generation
*/

pub mod classify;
pub mod format;

// Re-export key types for convenience
pub use classify::{
    assign, assign_closed, assign_with_oob, classify, compute_breaks, compute_breaks_with,
    ClassCountPolicy, Classification, ClassifyOptions, Closed, Oob, Strategy,
    DEFAULT_CLASS_COUNT,
};
pub use format::{format_labels, format_labels_with, LabelFormat};

/// Main library error type
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MapclassError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Value {value} is outside the classified range [{lower}, {upper}]")]
    OutOfRange { value: f64, lower: f64, upper: f64 },
}

pub type Result<T> = std::result::Result<T, MapclassError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Unemployment-style rates for a handful of districts
    fn district_rates() -> Vec<f64> {
        vec![
            3.1, 4.7, 5.2, 2.8, 9.9, 7.4, 6.1, 3.3, 12.6, 8.0, 4.4, 5.9, 11.2, 2.9, 6.6,
        ]
    }

    #[test]
    fn test_end_to_end_natural_breaks_legend() {
        let rates = district_rates();
        let result = classify(&rates, 4, Strategy::NaturalBreaks, &ClassifyOptions::default())
            .unwrap();

        // Every district lands in a class and the legend has one label per class
        assert_eq!(result.assignments().len(), rates.len());
        let format = LabelFormat {
            precision: Some(1),
            unit: "%".to_string(),
            ..LabelFormat::default()
        };
        let labels = format_labels_with(result.breaks(), &format, result.closed()).unwrap();
        assert_eq!(labels.len(), 4);
        assert!(labels.iter().all(|l| l.ends_with('%')));

        // The classifier's assignment agrees with looking values up one at a time
        for (value, class) in rates.iter().zip(result.assignments()) {
            assert_eq!(assign(*value, result.breaks()).unwrap(), *class);
        }
    }

    #[test]
    fn test_end_to_end_strategies_share_extremes() {
        let rates = district_rates();
        for strategy in [
            Strategy::EqualWidth,
            Strategy::Quantile,
            Strategy::NaturalBreaks,
        ] {
            let breaks = compute_breaks(&rates, 3, strategy).unwrap();
            assert_eq!(breaks.first(), Some(&2.8), "{}", strategy);
            assert_eq!(breaks.last(), Some(&12.6), "{}", strategy);
        }
    }

    #[test]
    fn test_error_messages() {
        let err = compute_breaks(&[], 3, Strategy::Quantile).unwrap_err();
        assert!(err.to_string().starts_with("Invalid argument"));

        let err = assign(100.0, &[0.0, 10.0]).unwrap_err();
        assert_eq!(
            err,
            MapclassError::OutOfRange {
                value: 100.0,
                lower: 0.0,
                upper: 10.0
            }
        );
        assert_eq!(
            err.to_string(),
            "Value 100 is outside the classified range [0, 10]"
        );
    }
}
