//! Editing session: which field drives the other three, and when.
//!
//! One session backs one editor instance. It owns the display text of all
//! four fields, remembers which field the user last touched (the authority),
//! and debounces commits through a single-slot timer:
//!
//! - `Idle` → an edit stores the raw text, makes that field the authority,
//!   and (re)arms the timer. Text that does not parse is still stored.
//! - `Editing(field)` → further edits replace the authority and re-arm the
//!   timer. Only the last edit in a burst ever commits.
//! - When the timer fires, the authority text is parsed and converted. A
//!   success rewrites the other three display values and notifies the host
//!   once. Any failure is silent. Either way the session is `Idle` again.
//!
//! Host pushes of fresh metrics only reseed the display while `Idle`, so the
//! host can never overwrite text the user is still typing.
//!
//! The session never sleeps. Hosts pass `Instant`s in and use
//! [`EditSession::next_deadline`] to decide how long they may block.

pub mod timer;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::SessionConfig;
use crate::domain::{MetricField, PositionMetrics, TradeParameters};
use crate::format::{format_metrics, format_value, parse_amount, Precision};
use crate::formula::{self, FormulaError};

pub use timer::{DebounceTimer, Scheduled};

/// Receives the full metrics tuple after every successful commit.
pub trait CommitSink {
    fn on_commit(&mut self, metrics: &PositionMetrics);
}

impl<F> CommitSink for F
where
    F: FnMut(&PositionMetrics),
{
    fn on_commit(&mut self, metrics: &PositionMetrics) {
        self(metrics)
    }
}

/// Sink that keeps every commit in order.
#[derive(Debug, Default, Clone)]
pub struct CommitLog {
    pub commits: Vec<PositionMetrics>,
}

impl CommitSink for CommitLog {
    fn on_commit(&mut self, metrics: &PositionMetrics) {
        self.commits.push(*metrics);
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Editing(MetricField),
    /// Trade parameters fail validation; no field is editable.
    MissingData,
    /// The host disabled editing.
    Disabled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Read-only caption the host may show above the fields.
    pub label: Option<String>,
    pub disabled: bool,
}

/// Why an edit was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditRejected {
    #[error("editing is disabled")]
    Disabled,

    #[error("trade parameters are incomplete or invalid")]
    MissingData,
}

/// Whether a host push resynced the display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Applied,
    /// An edit is in flight; display text was left alone.
    Deferred,
}

/// Why a fired timer did not produce a commit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("{field} text {text:?} is not a number")]
    Unparseable { field: MetricField, text: String },

    #[error(transparent)]
    Rejected(#[from] FormulaError),
}

/// Result of a timer firing.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed(PositionMetrics),
    Skipped(SkipReason),
}

pub struct EditSession<S: CommitSink> {
    params: TradeParameters,
    display: [String; 4],
    authority: Option<MetricField>,
    timer: DebounceTimer,
    precision: Precision,
    options: SessionOptions,
    sink: S,
}

impl<S: CommitSink> EditSession<S> {
    pub fn new(
        params: TradeParameters,
        initial: PositionMetrics,
        config: &SessionConfig,
        options: SessionOptions,
        sink: S,
    ) -> Self {
        let precision = config.precision();
        Self {
            params,
            display: format_metrics(&initial, &precision),
            authority: None,
            timer: DebounceTimer::new(config.debounce()),
            precision,
            options,
            sink,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        if self.options.disabled {
            SessionState::Disabled
        } else if !self.params.is_valid() {
            SessionState::MissingData
        } else if let Some(field) = self.authority {
            SessionState::Editing(field)
        } else {
            SessionState::Idle
        }
    }

    pub fn display(&self, field: MetricField) -> &str {
        &self.display[field.index()]
    }

    /// Display text of all four fields, in [`MetricField::ALL`] order.
    pub fn display_values(&self) -> &[String; 4] {
        &self.display
    }

    pub fn authority(&self) -> Option<MetricField> {
        self.authority
    }

    pub fn parameters(&self) -> &TradeParameters {
        &self.params
    }

    /// Decimals the session formats committed values with.
    pub fn precision(&self) -> &Precision {
        &self.precision
    }

    pub fn label(&self) -> Option<&str> {
        self.options.label.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.timer.pending().is_some()
    }

    /// When the pending commit becomes due, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ── User edits ─────────────────────────────────────────────────────

    /// Record a keystroke-level change to `field`.
    ///
    /// The raw text is stored even if it does not parse yet.
    pub fn edit(
        &mut self,
        field: MetricField,
        text: impl Into<String>,
        now: Instant,
    ) -> Result<(), EditRejected> {
        match self.state() {
            SessionState::Disabled => return Err(EditRejected::Disabled),
            SessionState::MissingData => return Err(EditRejected::MissingData),
            SessionState::Idle | SessionState::Editing(_) => {}
        }

        self.display[field.index()] = text.into();
        if let Some(previous) = self.authority.replace(field) {
            if previous != field {
                trace!(from = %previous, to = %field, "authority moved");
            }
        }
        let scheduled = self.timer.schedule(field, now);
        trace!(field = %field, ticket = scheduled.ticket, "commit scheduled");
        Ok(())
    }

    // ── Timer ──────────────────────────────────────────────────────────

    /// Fire the pending commit if it is due. Returns the committed metrics.
    pub fn poll(&mut self, now: Instant) -> Option<PositionMetrics> {
        match self.poll_outcome(now)? {
            CommitOutcome::Committed(metrics) => Some(metrics),
            CommitOutcome::Skipped(_) => None,
        }
    }

    /// Like [`poll`](Self::poll) but also reports skipped commits.
    pub fn poll_outcome(&mut self, now: Instant) -> Option<CommitOutcome> {
        let scheduled = self.timer.take_due(now)?;
        let field = self.authority.take().unwrap_or(scheduled.field);

        let outcome = match self.compute(field) {
            Ok(metrics) => {
                for other in MetricField::ALL.into_iter().filter(|f| *f != field) {
                    self.display[other.index()] =
                        format_value(other, metrics.get(other), &self.precision);
                }
                debug!(field = %field, ticket = scheduled.ticket, "commit applied");
                self.sink.on_commit(&metrics);
                CommitOutcome::Committed(metrics)
            }
            Err(reason) => {
                debug!(field = %field, ticket = scheduled.ticket, %reason, "commit skipped");
                CommitOutcome::Skipped(reason)
            }
        };
        Some(outcome)
    }

    fn compute(&self, field: MetricField) -> Result<PositionMetrics, SkipReason> {
        let text = self.display(field);
        let value = parse_amount(text).ok_or_else(|| SkipReason::Unparseable {
            field,
            text: text.to_string(),
        })?;
        Ok(formula::convert(field, value, &self.params)?)
    }

    // ── Host pushes ────────────────────────────────────────────────────

    /// Replace the trade parameters.
    ///
    /// Always stored, so the next commit uses them. Parameters that fail
    /// validation put the session into `MissingData`.
    pub fn push_parameters(&mut self, params: TradeParameters) -> PushOutcome {
        self.params = params;
        if self.authority.is_some() {
            PushOutcome::Deferred
        } else {
            PushOutcome::Applied
        }
    }

    /// Reseed all four display values from host-supplied metrics.
    ///
    /// Ignored while an edit is in flight.
    pub fn push_metrics(&mut self, metrics: PositionMetrics) -> PushOutcome {
        if let Some(field) = self.authority {
            trace!(editing = %field, "metrics push deferred");
            return PushOutcome::Deferred;
        }
        self.display = format_metrics(&metrics, &self.precision);
        PushOutcome::Applied
    }

    /// Enable or disable editing. Disabling drops any in-flight edit.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.options.disabled = disabled;
        if disabled {
            self.cancel_pending();
        }
    }

    // ── Teardown ───────────────────────────────────────────────────────

    /// Discard the session, cancelling any pending commit.
    pub fn teardown(self) {
        drop(self);
    }

    fn cancel_pending(&mut self) {
        if let Some(scheduled) = self.timer.cancel() {
            trace!(field = %scheduled.field, ticket = scheduled.ticket, "pending commit cancelled");
        }
        self.authority = None;
    }
}

impl<S: CommitSink> Drop for EditSession<S> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl<S: CommitSink> std::fmt::Debug for EditSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("params", &self.params)
            .field("display", &self.display)
            .field("authority", &self.authority)
            .field("timer", &self.timer)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionType;
    use std::time::Duration;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn params() -> TradeParameters {
        TradeParameters::new(100.0, 95.0, 10.0, PositionType::Long)
    }

    fn initial() -> PositionMetrics {
        PositionMetrics::new(100.0, 1000.0, 10.0, 50.0)
    }

    fn session() -> EditSession<CommitLog> {
        EditSession::new(
            params(),
            initial(),
            &SessionConfig::default(),
            SessionOptions::default(),
            CommitLog::default(),
        )
    }

    #[test]
    fn starts_idle_with_formatted_initial_values() {
        let s = session();
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.display(MetricField::Margin), "100.00");
        assert_eq!(s.display(MetricField::Quantity), "10.00000000");
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn edit_sets_authority_and_deadline() {
        let t0 = Instant::now();
        let mut s = session();
        s.edit(MetricField::Margin, "12", t0).unwrap();

        assert_eq!(s.state(), SessionState::Editing(MetricField::Margin));
        assert_eq!(s.display(MetricField::Margin), "12");
        assert_eq!(s.next_deadline(), Some(t0 + DEBOUNCE));
    }

    #[test]
    fn commit_rewrites_other_fields_but_not_the_authority_text() {
        let t0 = Instant::now();
        let mut s = session();
        s.edit(MetricField::Margin, "1000.", t0).unwrap();

        let committed = s.poll(t0 + DEBOUNCE).unwrap();
        assert_eq!(committed.margin, 1000.0);
        assert_eq!(s.display(MetricField::Margin), "1000.");
        assert_eq!(s.display(MetricField::PositionSize), "10000.00");
        assert_eq!(s.display(MetricField::Quantity), "100.00000000");
        assert_eq!(s.display(MetricField::OneR), "500.00");
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.sink().commits, vec![committed]);
    }

    #[test]
    fn poll_before_deadline_does_nothing() {
        let t0 = Instant::now();
        let mut s = session();
        s.edit(MetricField::Quantity, "5", t0).unwrap();

        assert!(s.poll_outcome(t0 + Duration::from_millis(299)).is_none());
        assert_eq!(s.state(), SessionState::Editing(MetricField::Quantity));
        assert!(s.sink().commits.is_empty());
    }

    #[test]
    fn unparseable_text_is_skipped_silently() {
        let t0 = Instant::now();
        let mut s = session();
        s.edit(MetricField::OneR, "", t0).unwrap();

        let outcome = s.poll_outcome(t0 + DEBOUNCE).unwrap();
        assert!(matches!(outcome, CommitOutcome::Skipped(SkipReason::Unparseable { .. })));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.display(MetricField::OneR), "");
        assert_eq!(s.display(MetricField::Margin), "100.00");
        assert!(s.sink().commits.is_empty());
    }

    #[test]
    fn overflowing_commit_is_skipped_and_display_kept() {
        let t0 = Instant::now();
        let huge = TradeParameters::new(100.0, 95.0, 1e300, PositionType::Long);
        let mut s = EditSession::new(
            huge,
            PositionMetrics::new(1.0, 2.0, 3.0, 4.0),
            &SessionConfig::default(),
            SessionOptions::default(),
            CommitLog::default(),
        );
        let before = s.display_values().clone();
        s.edit(MetricField::Margin, "1e300", t0).unwrap();

        let outcome = s.poll_outcome(t0 + DEBOUNCE).unwrap();
        assert!(matches!(
            outcome,
            CommitOutcome::Skipped(SkipReason::Rejected(FormulaError::NonFinite { .. }))
        ));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.display(MetricField::Margin), "1e300");
        for field in [MetricField::PositionSize, MetricField::Quantity, MetricField::OneR] {
            assert_eq!(s.display(field), before[field.index()]);
        }
        assert!(s.sink().commits.is_empty());
    }

    #[test]
    fn zero_is_skipped_as_invalid_input() {
        let t0 = Instant::now();
        let mut s = session();
        s.edit(MetricField::Margin, "0", t0).unwrap();

        let outcome = s.poll_outcome(t0 + DEBOUNCE).unwrap();
        assert!(matches!(
            outcome,
            CommitOutcome::Skipped(SkipReason::Rejected(FormulaError::InvalidInput { .. }))
        ));
    }

    #[test]
    fn metrics_push_is_deferred_while_editing() {
        let t0 = Instant::now();
        let mut s = session();
        s.edit(MetricField::Margin, "7", t0).unwrap();

        let outcome = s.push_metrics(PositionMetrics::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(outcome, PushOutcome::Deferred);
        assert_eq!(s.display(MetricField::Margin), "7");
        assert_eq!(s.display(MetricField::PositionSize), "1000.00");
    }

    #[test]
    fn metrics_push_applies_when_idle() {
        let mut s = session();
        let outcome = s.push_metrics(PositionMetrics::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(outcome, PushOutcome::Applied);
        assert_eq!(s.display_values(), &["1.00", "2.00", "3.00000000", "4.00"].map(String::from));
    }

    #[test]
    fn invalid_parameters_block_edits() {
        let t0 = Instant::now();
        let mut s = session();
        s.push_parameters(TradeParameters::new(100.0, 100.0, 10.0, PositionType::Long));

        assert_eq!(s.state(), SessionState::MissingData);
        assert_eq!(s.edit(MetricField::Margin, "5", t0), Err(EditRejected::MissingData));
        assert!(!s.is_pending());
    }

    #[test]
    fn parameters_invalidated_mid_edit_skip_the_commit() {
        let t0 = Instant::now();
        let mut s = session();
        s.edit(MetricField::Margin, "500", t0).unwrap();
        assert_eq!(
            s.push_parameters(TradeParameters::new(100.0, 0.0, 10.0, PositionType::Long)),
            PushOutcome::Deferred
        );

        let outcome = s.poll_outcome(t0 + DEBOUNCE).unwrap();
        assert!(matches!(
            outcome,
            CommitOutcome::Skipped(SkipReason::Rejected(FormulaError::InvalidConfiguration(_)))
        ));
        assert_eq!(s.authority(), None);
        assert_eq!(s.state(), SessionState::MissingData);
    }

    #[test]
    fn disabled_session_rejects_edits_but_accepts_pushes() {
        let t0 = Instant::now();
        let mut s = EditSession::new(
            params(),
            initial(),
            &SessionConfig::default(),
            SessionOptions { label: Some("Planned".into()), disabled: true },
            CommitLog::default(),
        );

        assert_eq!(s.state(), SessionState::Disabled);
        assert_eq!(s.label(), Some("Planned"));
        assert_eq!(s.edit(MetricField::Margin, "5", t0), Err(EditRejected::Disabled));
        assert_eq!(s.push_metrics(PositionMetrics::new(1.0, 2.0, 3.0, 4.0)), PushOutcome::Applied);
    }

    #[test]
    fn disabling_drops_the_in_flight_edit() {
        let t0 = Instant::now();
        let mut s = session();
        s.edit(MetricField::Margin, "5", t0).unwrap();
        s.set_disabled(true);

        assert!(!s.is_pending());
        assert_eq!(s.authority(), None);
        assert!(s.poll(t0 + DEBOUNCE).is_none());
    }

    #[test]
    fn closure_sink_receives_commits() {
        let t0 = Instant::now();
        let mut seen = Vec::new();
        {
            let mut s = EditSession::new(
                params(),
                initial(),
                &SessionConfig::default(),
                SessionOptions::default(),
                |m: &PositionMetrics| seen.push(*m),
            );
            s.edit(MetricField::Quantity, "2", t0).unwrap();
            s.poll(t0 + DEBOUNCE);
        }
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].quantity, 2.0);
    }
}
