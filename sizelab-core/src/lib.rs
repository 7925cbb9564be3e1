//! SizeLab Core: leveraged position sizing with four linked fields.
//!
//! This crate contains:
//! - Domain types (trade parameters, position metrics, field identifiers)
//! - Formula engine: closed-form conversions from any one field to the rest
//! - Precision rules for rendering and parsing field text
//! - Editing session: authority tracking, debounced commits, host pushes
//! - Session configuration (TOML)
//! - Risk plan helpers for seeding a session from portfolio and risk budget

pub mod config;
pub mod domain;
pub mod format;
pub mod formula;
pub mod plan;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use domain::{MetricField, PositionMetrics, PositionType, TradeParameters};
pub use format::Precision;
pub use formula::FormulaError;
pub use session::{
    CommitLog, CommitOutcome, CommitSink, EditRejected, EditSession, PushOutcome, SessionOptions,
    SessionState, SkipReason,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: value types can cross to a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<TradeParameters>();
        require_sync::<TradeParameters>();
        require_send::<PositionMetrics>();
        require_sync::<PositionMetrics>();
        require_send::<SessionConfig>();
        require_sync::<SessionConfig>();
        require_send::<FormulaError>();
        require_sync::<FormulaError>();
        require_send::<EditSession<CommitLog>>();
    }

    /// Architecture contract: the formula engine takes parameters by shared
    /// reference and returns values. It cannot hold state between calls.
    #[test]
    fn formula_entry_points_are_plain_functions() {
        let entry: fn(f64, &TradeParameters) -> Result<PositionMetrics, FormulaError> =
            formula::from_margin;
        let params = TradeParameters::new(100.0, 95.0, 10.0, PositionType::Long);
        assert!(entry(1.0, &params).is_ok());
    }
}
