//! Text rendering and parsing for field values.
//!
//! Currency-like fields render with 2 decimals and quantity with 8, enough
//! to show small-quantity, high-leverage instruments. Symbols, separators,
//! and locales are host concerns.

use serde::{Deserialize, Serialize};

use crate::domain::{MetricField, PositionMetrics, PrecisionClass};

/// Decimal places used when a value becomes display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    pub currency_decimals: u32,
    pub quantity_decimals: u32,
}

impl Default for Precision {
    fn default() -> Self {
        Self { currency_decimals: 2, quantity_decimals: 8 }
    }
}

impl Precision {
    pub fn decimals(&self, field: MetricField) -> usize {
        match field.precision_class() {
            PrecisionClass::Currency => self.currency_decimals as usize,
            PrecisionClass::Quantity => self.quantity_decimals as usize,
        }
    }
}

pub fn format_value(field: MetricField, value: f64, precision: &Precision) -> String {
    format!("{:.*}", precision.decimals(field), value)
}

/// Render all four fields, in [`MetricField::ALL`] order.
pub fn format_metrics(metrics: &PositionMetrics, precision: &Precision) -> [String; 4] {
    MetricField::ALL.map(|field| format_value(field, metrics.get(field), precision))
}

/// Parse user text into a finite number.
///
/// Accepts partial decimals such as `"12."` or `".5"`, a leading sign, and
/// exponent forms such as `"1e3"` or `"2.5E-2"`. Returns `None` for
/// empty text, a lone sign or dot, and anything that is not finite.
/// Positivity is the caller's check.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    // Reject spellings like "inf" or "NaN" that str::parse would accept.
    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_and_quantity_precision() {
        let p = Precision::default();
        assert_eq!(format_value(MetricField::Margin, 1000.0, &p), "1000.00");
        assert_eq!(format_value(MetricField::OneR, 12.345, &p), "12.35");
        assert_eq!(format_value(MetricField::Quantity, 0.000_012_345_6, &p), "0.00001235");
    }

    #[test]
    fn format_metrics_follows_field_order() {
        let m = PositionMetrics::new(1000.0, 10_000.0, 100.0, 500.0);
        let text = format_metrics(&m, &Precision::default());
        assert_eq!(text, ["1000.00", "10000.00", "100.00000000", "500.00"].map(String::from));
    }

    #[test]
    fn parses_partial_decimals() {
        assert_eq!(parse_amount("12."), Some(12.0));
        assert_eq!(parse_amount(".5"), Some(0.5));
        assert_eq!(parse_amount("  250 "), Some(250.0));
        assert_eq!(parse_amount("1e3"), Some(1000.0));
        assert_eq!(parse_amount("+2.5E-2"), Some(0.025));
    }

    #[test]
    fn rejects_in_progress_and_special_text() {
        for text in ["", " ", ".", "-", "abc", "12a", "inf", "NaN", "1,000"] {
            assert_eq!(parse_amount(text), None, "{text:?}");
        }
    }

    #[test]
    fn negative_text_parses_but_stays_negative() {
        assert_eq!(parse_amount("-5"), Some(-5.0));
    }
}
