//! Risk plan helpers: derive a starting size from portfolio and risk budget.
//!
//! A session is seeded with initial metrics. When a trade is first planned
//! those come from the account: 1R is a fixed fraction of the portfolio, and
//! the other three fields follow from the `one_r` conversion.

use thiserror::Error;

use crate::domain::{PositionMetrics, PositionType, TradeParameters};
use crate::formula::{self, FormulaError};

/// Default upper bound for [`max_leverage_for_stop`].
pub const DEFAULT_LEVERAGE_CAP: u32 = 20;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("portfolio value must be positive (got {0})")]
    InvalidPortfolio(f64),

    #[error("risk percent must be in (0, 1] (got {0})")]
    InvalidRiskPercent(f64),

    #[error(transparent)]
    Formula(#[from] FormulaError),
}

/// 1R in currency: the fraction of the portfolio put at risk per trade.
///
/// `r_percent` is a fraction, so 1% is `0.01`.
pub fn risk_budget(portfolio_value: f64, r_percent: f64) -> Result<f64, PlanError> {
    if !(portfolio_value.is_finite() && portfolio_value > 0.0) {
        return Err(PlanError::InvalidPortfolio(portfolio_value));
    }
    if !(r_percent.is_finite() && r_percent > 0.0 && r_percent <= 1.0) {
        return Err(PlanError::InvalidRiskPercent(r_percent));
    }
    Ok(portfolio_value * r_percent)
}

/// Full metrics for risking exactly one risk budget at the given parameters.
pub fn suggest_metrics(
    portfolio_value: f64,
    r_percent: f64,
    params: &TradeParameters,
) -> Result<PositionMetrics, PlanError> {
    let one_r = risk_budget(portfolio_value, r_percent)?;
    Ok(formula::from_one_r(one_r, params)?)
}

/// Highest whole leverage at which the stop is hit before the margin is gone.
///
/// `floor(1 / stop_distance_pct)`, clamped to `[1, cap]`.
pub fn max_leverage_for_stop(params: &TradeParameters, cap: u32) -> u32 {
    let cap = cap.max(1);
    let pct = params.stop_distance_pct();
    if !(pct.is_finite() && pct > 0.0) {
        return cap;
    }
    let raw = (1.0 / pct).floor();
    if raw >= cap as f64 {
        cap
    } else {
        (raw as u32).max(1)
    }
}

/// Stop loss implied by a known 1R and quantity.
///
/// `None` unless entry, 1R and quantity are positive and the stop lands above zero.
pub fn estimate_stop_loss(
    entry_price: f64,
    one_r: f64,
    quantity: f64,
    position_type: PositionType,
) -> Option<f64> {
    if !(entry_price.is_finite() && entry_price > 0.0 && quantity > 0.0 && one_r > 0.0) {
        return None;
    }
    let distance = one_r / quantity;
    let stop = match position_type {
        PositionType::Long => entry_price - distance,
        PositionType::Short => entry_price + distance,
    };
    Some(stop).filter(|s| s.is_finite() && *s > 0.0)
}

/// Realized PnL expressed in multiples of 1R.
pub fn pnl_in_r(total_pnl: f64, one_r: f64) -> Option<f64> {
    if one_r > 0.0 {
        Some(total_pnl / one_r)
    } else {
        None
    }
}
