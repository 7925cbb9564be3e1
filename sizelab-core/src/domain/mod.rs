//! Domain types for sizelab

pub mod metrics;
pub mod params;

pub use metrics::{MetricField, PositionMetrics, PrecisionClass};
pub use params::{PositionType, TradeParameters};
