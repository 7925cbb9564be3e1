use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::formula::FormulaError;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionType {
    Long,
    Short,
}

impl PositionType {
    pub fn label(self) -> &'static str {
        match self {
            PositionType::Long => "LONG",
            PositionType::Short => "SHORT",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            PositionType::Long => PositionType::Short,
            PositionType::Short => PositionType::Long,
        }
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PositionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(PositionType::Long),
            "short" => Ok(PositionType::Short),
            other => Err(format!("unknown position type '{other}' (expected long or short)")),
        }
    }
}

/// Fixed inputs to every conversion. Owned by the host and replaced wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeParameters {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub leverage: f64,
    pub position_type: PositionType,
}

impl TradeParameters {
    pub fn new(entry_price: f64, stop_loss: f64, leverage: f64, position_type: PositionType) -> Self {
        Self { entry_price, stop_loss, leverage, position_type }
    }

    /// Loss per unit if price travels from entry to stop.
    ///
    /// Positive only when the stop sits on the losing side of the entry for
    /// the declared direction.
    pub fn risk_per_unit(&self) -> f64 {
        match self.position_type {
            PositionType::Long => self.entry_price - self.stop_loss,
            PositionType::Short => self.stop_loss - self.entry_price,
        }
    }

    /// Distance between entry and stop as a fraction of entry.
    pub fn stop_distance_pct(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs() / self.entry_price
    }

    /// Check the precondition that gates every computation.
    pub fn validate(&self) -> Result<(), FormulaError> {
        let invalid = |reason: &str| Err(FormulaError::InvalidConfiguration(reason.to_string()));

        if !(self.entry_price.is_finite() && self.entry_price > 0.0) {
            return invalid("entry price must be positive");
        }
        if !(self.stop_loss.is_finite() && self.stop_loss > 0.0) {
            return invalid("stop loss must be positive");
        }
        if !(self.leverage.is_finite() && self.leverage > 0.0) {
            return invalid("leverage must be positive");
        }
        if self.entry_price == self.stop_loss {
            return invalid("entry price and stop loss are equal");
        }
        if self.risk_per_unit() <= 0.0 {
            return match self.position_type {
                PositionType::Long => invalid("LONG requires stop loss below entry price"),
                PositionType::Short => invalid("SHORT requires stop loss above entry price"),
            };
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
