//! Legend label generation for classified breakpoints
//!
//! Supports placeholder syntax in label templates:
//! - `{lower}` - Rounded lower breakpoint of the class
//! - `{upper}` - Rounded upper breakpoint of the class
//! - `{unit}` - Unit suffix (e.g. `%`)
//! - `{index}` - 1-based class number
//!
//! Unknown placeholders are left in the output verbatim.
//!
//! Breakpoints are rounded like C `printf("%.2f")`: the exact binary value is
//! rounded and exact ties go to the even digit. `2.675` is stored as
//! `2.67499...` and gives `2.67`; `0.125` gives `0.12`. Each breakpoint is
//! rounded once and the same text is shared by the two labels it borders, so
//! adjacent labels can never overlap or leave a gap.

use regex::Regex;
use std::sync::OnceLock;

use crate::classify::{validate_breaks, Closed};
use crate::Result;

/// Default label template: `"10 to 20%"`
pub const DEFAULT_LABEL_TEMPLATE: &str = "{lower} to {upper}{unit}";

/// Largest precision tried when choosing one automatically
pub const MAX_AUTO_PRECISION: usize = 10;

/// How class labels are rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFormat {
    /// Decimal digits; `None` picks the smallest precision that keeps distinct
    /// breakpoints distinct
    pub precision: Option<usize>,
    /// Suffix substituted for `{unit}`
    pub unit: String,
    /// Template with `{lower}`, `{upper}`, `{unit}` and `{index}` placeholders
    pub template: String,
    /// Render the first and last classes as open-ended (`< 20`, `≥ 80`)
    pub open_ends: bool,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self {
            precision: None,
            unit: String::new(),
            template: DEFAULT_LABEL_TEMPLATE.to_string(),
            open_ends: false,
        }
    }
}

/// Placeholder types supported in label templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Lower,
    Upper,
    Unit,
    Index,
}

/// A parsed template piece
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// Regex for matching placeholders in templates
fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^}]*)\}").expect("Invalid placeholder regex"))
}

/// Split a template into literal text and placeholders
fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for cap in placeholder_regex().find_iter(template) {
        if cap.start() > last {
            segments.push(Segment::Literal(template[last..cap.start()].to_string()));
        }
        let inner = &template[cap.start() + 1..cap.end() - 1];
        let segment = match inner.trim() {
            "lower" => Segment::Placeholder(Placeholder::Lower),
            "upper" => Segment::Placeholder(Placeholder::Upper),
            "unit" => Segment::Placeholder(Placeholder::Unit),
            "index" => Segment::Placeholder(Placeholder::Index),
            _ => Segment::Literal(cap.as_str().to_string()), // Unknown, keep as written
        };
        segments.push(segment);
        last = cap.end();
    }
    if last < template.len() {
        segments.push(Segment::Literal(template[last..].to_string()));
    }
    segments
}

fn render(segments: &[Segment], lower: &str, upper: &str, unit: &str, index: usize) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(Placeholder::Lower) => out.push_str(lower),
            Segment::Placeholder(Placeholder::Upper) => out.push_str(upper),
            Segment::Placeholder(Placeholder::Unit) => out.push_str(unit),
            Segment::Placeholder(Placeholder::Index) => out.push_str(&index.to_string()),
        }
    }
    out
}

// =============================================================================
// Rounding
// =============================================================================

/// Format `value` with exactly `precision` decimals using printf `%.<precision>f`.
///
/// Negative values that round to zero print without a sign. Non-finite values
/// print as `NaN`, `inf` or `-inf`.
pub fn format_number(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let spec = format!("%.{}f", precision);
    let text = sprintf::sprintf!(&spec, value)
        .unwrap_or_else(|_| format!("{:.*}", precision, value));

    match text.strip_prefix('-') {
        Some(digits) if digits.bytes().all(|b| b == b'0' || b == b'.') => digits.to_string(),
        _ => text,
    }
}

/// Smallest precision in `0..=MAX_AUTO_PRECISION` at which every pair of
/// distinct adjacent breakpoints still formats differently.
pub fn auto_precision(breaks: &[f64]) -> usize {
    (0..=MAX_AUTO_PRECISION)
        .find(|&p| {
            breaks
                .windows(2)
                .filter(|w| w[0] != w[1])
                .all(|w| format_number(w[0], p) != format_number(w[1], p))
        })
        .unwrap_or(MAX_AUTO_PRECISION)
}

// =============================================================================
// Labels (Public API)
// =============================================================================

/// One `"<lower> to <upper>"` label per class, rounded to `precision` digits.
pub fn format_labels(breaks: &[f64], precision: usize) -> Result<Vec<String>> {
    let format = LabelFormat {
        precision: Some(precision),
        ..LabelFormat::default()
    };
    format_labels_with(breaks, &format, Closed::Left)
}

/// One label per class using a full [`LabelFormat`].
///
/// `closed` only affects the symbols used for open-ended labels:
/// `<` / `≥` for left-closed classes, `≤` / `>` for right-closed ones.
pub fn format_labels_with(
    breaks: &[f64],
    format: &LabelFormat,
    closed: Closed,
) -> Result<Vec<String>> {
    validate_breaks(breaks)?;

    let precision = format.precision.unwrap_or_else(|| auto_precision(breaks));
    let rounded: Vec<String> = breaks.iter().map(|&b| format_number(b, precision)).collect();
    let segments = parse_template(&format.template);
    let classes = breaks.len() - 1;
    let unit = format.unit.as_str();

    let labels = (0..classes)
        .map(|i| {
            let lower = &rounded[i];
            let upper = &rounded[i + 1];
            let open = format.open_ends && classes > 1;

            if open && i == 0 {
                let symbol = if closed == Closed::Right { "≤" } else { "<" };
                format!("{} {}{}", symbol, upper, unit)
            } else if open && i == classes - 1 {
                let symbol = if closed == Closed::Right { ">" } else { "≥" };
                format!("{} {}{}", symbol, lower, unit)
            } else {
                render(&segments, lower, upper, unit, i + 1)
            }
        })
        .collect();

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapclassError;

    // =========================================================================
    // Rounding Tests
    // =========================================================================

    #[test]
    fn test_format_number_rounds_binary_value() {
        // Format: (value, precision, expected)
        let cases = vec![
            (2.675, 2, "2.67"),
            (1.005, 2, "1.00"),
            (0.05, 1, "0.1"),
            (21.599999999999998, 1, "21.6"),
            (9.96, 1, "10.0"),
            (7.0, 2, "7.00"),
            (12.34, 0, "12"),
            (-3.14159, 3, "-3.142"),
            (0.0, 1, "0.0"),
        ];
        for (value, precision, expected) in cases {
            assert_eq!(
                format_number(value, precision),
                expected,
                "format_number({}, {})",
                value,
                precision
            );
        }
    }

    #[test]
    fn test_format_number_exact_ties_go_to_even() {
        assert_eq!(format_number(2.5, 0), "2");
        assert_eq!(format_number(3.5, 0), "4");
        assert_eq!(format_number(-2.5, 0), "-2");
        assert_eq!(format_number(99.5, 0), "100");
        assert_eq!(format_number(0.125, 2), "0.12");
        assert_eq!(format_number(0.375, 2), "0.38");
    }

    #[test]
    fn test_format_number_drops_negative_zero() {
        assert_eq!(format_number(-0.04, 1), "0.0");
        assert_eq!(format_number(-0.0, 0), "0");
        assert_eq!(format_number(-0.05, 1), "-0.1");
    }

    #[test]
    fn test_format_number_extreme_magnitudes() {
        assert_eq!(format_number(1e-7, 3), "0.000");
        assert_eq!(format_number(1.7e-7, 7), "0.0000002");
        assert_eq!(format_number(1e16, 0), "10000000000000000");
    }

    #[test]
    fn test_format_number_non_finite() {
        assert_eq!(format_number(f64::NAN, 2), "NaN");
        assert_eq!(format_number(f64::INFINITY, 2), "inf");
        assert_eq!(format_number(f64::NEG_INFINITY, 0), "-inf");
    }

    #[test]
    fn test_auto_precision() {
        assert_eq!(auto_precision(&[10.0, 20.0, 30.0]), 0);
        assert_eq!(auto_precision(&[0.0, 0.25, 0.5, 1.0]), 1);
        assert_eq!(auto_precision(&[1.0, 1.001, 2.0]), 3);
        // Repeated breakpoints do not force extra digits
        assert_eq!(auto_precision(&[1.0, 1.0, 2.0]), 0);
    }

    // =========================================================================
    // Label Tests
    // =========================================================================

    #[test]
    fn test_format_labels_basic() {
        let labels = format_labels(&[10.0, 20.0, 30.0], 0).unwrap();
        assert_eq!(labels, vec!["10 to 20", "20 to 30"]);
    }

    #[test]
    fn test_adjacent_labels_share_rounded_breakpoint() {
        let labels = format_labels(&[0.04, 0.16, 0.26], 1).unwrap();
        assert_eq!(labels, vec!["0.0 to 0.2", "0.2 to 0.3"]);
    }

    #[test]
    fn test_unit_and_template() {
        let format = LabelFormat {
            precision: Some(0),
            unit: "%".to_string(),
            ..LabelFormat::default()
        };
        let labels = format_labels_with(&[10.0, 20.0, 30.0], &format, Closed::Left).unwrap();
        assert_eq!(labels, vec!["10 to 20%", "20 to 30%"]);

        let format = LabelFormat {
            precision: Some(1),
            unit: " km".to_string(),
            template: "Class {index}: {lower}{unit} – {upper}{unit} {other}".to_string(),
            open_ends: false,
        };
        let labels = format_labels_with(&[0.0, 2.5], &format, Closed::Left).unwrap();
        assert_eq!(labels, vec!["Class 1: 0.0 km – 2.5 km {other}"]);
    }

    #[test]
    fn test_open_ends() {
        let format = LabelFormat {
            precision: Some(0),
            open_ends: true,
            ..LabelFormat::default()
        };
        let breaks = [0.0, 20.0, 50.0, 80.0];

        let left = format_labels_with(&breaks, &format, Closed::Left).unwrap();
        assert_eq!(left, vec!["< 20", "20 to 50", "≥ 50"]);

        let right = format_labels_with(&breaks, &format, Closed::Right).unwrap();
        assert_eq!(right, vec!["≤ 20", "20 to 50", "> 50"]);

        // A single class keeps its closed range
        let single = format_labels_with(&[0.0, 1.0], &format, Closed::Left).unwrap();
        assert_eq!(single, vec!["0 to 1"]);
    }

    #[test]
    fn test_auto_precision_labels() {
        let labels =
            format_labels_with(&[0.0, 0.25, 0.5], &LabelFormat::default(), Closed::Left).unwrap();
        assert_eq!(labels, vec!["0.0 to 0.2", "0.2 to 0.5"]);
    }

    #[test]
    fn test_format_labels_rejects_malformed_breaks() {
        assert!(matches!(
            format_labels(&[1.0], 1),
            Err(MapclassError::InvalidArgument(_))
        ));
        assert!(matches!(
            format_labels(&[3.0, 1.0], 1),
            Err(MapclassError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_template_segments() {
        let segments = parse_template("{lower}-{upper}{unit}");
        assert_eq!(
            segments,
            vec![
                Segment::Placeholder(Placeholder::Lower),
                Segment::Literal("-".to_string()),
                Segment::Placeholder(Placeholder::Upper),
                Segment::Placeholder(Placeholder::Unit),
            ]
        );
        assert_eq!(
            parse_template("no placeholders"),
            vec![Segment::Literal("no placeholders".to_string())]
        );
    }
}
