//! Formula engine: closed-form conversions between the four sizing metrics.
//!
//! Stateless and synchronous. Each entry point takes one authoritative value
//! plus the trade parameters and returns the complete metrics tuple, echoing
//! the input unchanged. No rounding happens here; rounding belongs to
//! [`crate::format`].
//!
//! # Formula
//! ```text
//! risk_per_unit = LONG ? entry - stop : stop - entry
//! position_size = margin * leverage      = quantity * entry
//! quantity      = position_size / entry  = one_r / risk_per_unit
//! margin        = position_size / leverage
//! one_r         = quantity * risk_per_unit
//! ```
//!
//! # Example
//! - Entry 100, stop 95, leverage 10x, LONG
//! - Margin $1,000 → cost $10,000 → 100 units → 1R = 100 * 5 = $500

use thiserror::Error;

use crate::domain::{MetricField, PositionMetrics, TradeParameters};

/// Errors from a conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("{field} must be a positive number (got {value})")]
    InvalidInput { field: MetricField, value: f64 },

    #[error("invalid trade parameters: {0}")]
    InvalidConfiguration(String),

    #[error("conversion from {field} produced a non-finite result")]
    NonFinite { field: MetricField },
}

/// Convert from whichever field is authoritative.
pub fn convert(
    field: MetricField,
    value: f64,
    params: &TradeParameters,
) -> Result<PositionMetrics, FormulaError> {
    match field {
        MetricField::Margin => from_margin(value, params),
        MetricField::PositionSize => from_position_size(value, params),
        MetricField::Quantity => from_quantity(value, params),
        MetricField::OneR => from_one_r(value, params),
    }
}

pub fn from_margin(margin: f64, params: &TradeParameters) -> Result<PositionMetrics, FormulaError> {
    let risk = check(MetricField::Margin, margin, params)?;

    let position_size = margin * params.leverage;
    let quantity = position_size / params.entry_price;
    let one_r = quantity * risk;

    finish(MetricField::Margin, PositionMetrics { margin, position_size, quantity, one_r })
}

pub fn from_position_size(
    position_size: f64,
    params: &TradeParameters,
) -> Result<PositionMetrics, FormulaError> {
    let risk = check(MetricField::PositionSize, position_size, params)?;

    let quantity = position_size / params.entry_price;
    let margin = position_size / params.leverage;
    let one_r = quantity * risk;

    finish(MetricField::PositionSize, PositionMetrics { margin, position_size, quantity, one_r })
}

pub fn from_quantity(quantity: f64, params: &TradeParameters) -> Result<PositionMetrics, FormulaError> {
    let risk = check(MetricField::Quantity, quantity, params)?;

    let position_size = quantity * params.entry_price;
    let margin = position_size / params.leverage;
    let one_r = quantity * risk;

    finish(MetricField::Quantity, PositionMetrics { margin, position_size, quantity, one_r })
}

pub fn from_one_r(one_r: f64, params: &TradeParameters) -> Result<PositionMetrics, FormulaError> {
    let risk = check(MetricField::OneR, one_r, params)?;

    let quantity = one_r / risk;
    let position_size = quantity * params.entry_price;
    let margin = position_size / params.leverage;

    finish(MetricField::OneR, PositionMetrics { margin, position_size, quantity, one_r })
}

/// Validate parameters first, then the input. Returns the risk per unit.
fn check(field: MetricField, value: f64, params: &TradeParameters) -> Result<f64, FormulaError> {
    params.validate()?;
    if !(value.is_finite() && value > 0.0) {
        return Err(FormulaError::InvalidInput { field, value });
    }
    Ok(params.risk_per_unit())
}

fn finish(field: MetricField, metrics: PositionMetrics) -> Result<PositionMetrics, FormulaError> {
    if metrics.is_finite() {
        Ok(metrics)
    } else {
        Err(FormulaError::NonFinite { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionType;

    fn long_params() -> TradeParameters {
        TradeParameters::new(100.0, 95.0, 10.0, PositionType::Long)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0), "{a} != {b}");
    }

    #[test]
    fn margin_entry_matches_worked_example() {
        let m = from_margin(1000.0, &long_params()).unwrap();
        assert_close(m.margin, 1000.0);
        assert_close(m.position_size, 10_000.0);
        assert_close(m.quantity, 100.0);
        assert_close(m.one_r, 500.0);
    }

    #[test]
    fn each_entry_point_reproduces_the_same_tuple() {
        let p = long_params();
        let base = from_margin(1000.0, &p).unwrap();

        for field in MetricField::ALL {
            let m = convert(field, base.get(field), &p).unwrap();
            assert!(m.approx_eq(&base, 1e-9), "{field}: {m:?} vs {base:?}");
        }
    }

    #[test]
    fn short_position_uses_stop_above_entry() {
        let p = TradeParameters::new(200.0, 210.0, 5.0, PositionType::Short);
        let m = from_one_r(100.0, &p).unwrap();
        // risk per unit = 10, quantity = 10, cost = 2000, margin = 400
        assert_close(m.quantity, 10.0);
        assert_close(m.position_size, 2000.0);
        assert_close(m.margin, 400.0);
    }

    #[test]
    fn input_is_echoed_unchanged() {
        let p = long_params();
        let m = from_quantity(0.123_456_789, &p).unwrap();
        assert_eq!(m.quantity, 0.123_456_789);
    }

    #[test]
    fn non_positive_input_is_rejected() {
        let p = long_params();
        assert_eq!(
            from_margin(0.0, &p),
            Err(FormulaError::InvalidInput { field: MetricField::Margin, value: 0.0 })
        );
        assert!(matches!(
            from_quantity(-3.0, &p),
            Err(FormulaError::InvalidInput { field: MetricField::Quantity, .. })
        ));
        assert!(matches!(from_one_r(f64::NAN, &p), Err(FormulaError::InvalidInput { .. })));
    }

    #[test]
    fn configuration_is_checked_before_input() {
        let p = TradeParameters::new(100.0, 110.0, 10.0, PositionType::Long);
        assert!(matches!(from_margin(1000.0, &p), Err(FormulaError::InvalidConfiguration(_))));
        assert!(matches!(from_margin(-1.0, &p), Err(FormulaError::InvalidConfiguration(_))));
    }

    #[test]
    fn overflow_is_reported_as_non_finite() {
        let p = TradeParameters::new(100.0, 95.0, 1e300, PositionType::Long);
        assert_eq!(
            from_margin(1e300, &p),
            Err(FormulaError::NonFinite { field: MetricField::Margin })
        );
    }
}
