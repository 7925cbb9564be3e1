use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four linked sizing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Margin,
    PositionSize,
    Quantity,
    OneR,
}

/// How a field is rounded when it is rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecisionClass {
    Currency,
    Quantity,
}

impl MetricField {
    pub const ALL: [MetricField; 4] = [
        MetricField::Margin,
        MetricField::PositionSize,
        MetricField::Quantity,
        MetricField::OneR,
    ];

    pub fn index(self) -> usize {
        match self {
            MetricField::Margin => 0,
            MetricField::PositionSize => 1,
            MetricField::Quantity => 2,
            MetricField::OneR => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricField::Margin => "Margin",
            MetricField::PositionSize => "Cost",
            MetricField::Quantity => "Quantity",
            MetricField::OneR => "1R",
        }
    }

    pub fn precision_class(self) -> PrecisionClass {
        match self {
            MetricField::Quantity => PrecisionClass::Quantity,
            _ => PrecisionClass::Currency,
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MetricField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "margin" => Ok(MetricField::Margin),
            "position_size" | "cost" | "notional" => Ok(MetricField::PositionSize),
            "quantity" | "qty" => Ok(MetricField::Quantity),
            "one_r" | "1r" | "r" => Ok(MetricField::OneR),
            other => Err(format!(
                "unknown field '{other}' (expected margin, position_size, quantity or one_r)"
            )),
        }
    }
}

/// The four sizing metrics. Any one of them determines the other three.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionMetrics {
    pub margin: f64,
    pub position_size: f64,
    pub quantity: f64,
    pub one_r: f64,
}

impl PositionMetrics {
    pub fn new(margin: f64, position_size: f64, quantity: f64, one_r: f64) -> Self {
        Self { margin, position_size, quantity, one_r }
    }

    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::Margin => self.margin,
            MetricField::PositionSize => self.position_size,
            MetricField::Quantity => self.quantity,
            MetricField::OneR => self.one_r,
        }
    }

    pub fn with(mut self, field: MetricField, value: f64) -> Self {
        match field {
            MetricField::Margin => self.margin = value,
            MetricField::PositionSize => self.position_size = value,
            MetricField::Quantity => self.quantity = value,
            MetricField::OneR => self.one_r = value,
        }
        self
    }

    pub fn is_finite(&self) -> bool {
        MetricField::ALL.iter().all(|f| self.get(*f).is_finite())
    }

    /// Field-wise comparison with a relative tolerance.
    pub fn approx_eq(&self, other: &PositionMetrics, rel_tol: f64) -> bool {
        MetricField::ALL.iter().all(|f| {
            let (a, b) = (self.get(*f), other.get(*f));
            let scale = a.abs().max(b.abs()).max(1.0);
            (a - b).abs() <= rel_tol * scale
        })
    }
}
