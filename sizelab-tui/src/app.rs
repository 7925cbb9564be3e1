//! Application state: single-owner, main-thread only.
//!
//! The parameter form is host state. The four sizing fields belong to the
//! `EditSession`; the app only forwards keystrokes and pushes.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use sizelab_core::formula;
use sizelab_core::plan;
use sizelab_core::{
    CommitSink, EditRejected, EditSession, MetricField, PositionMetrics, PositionType, PushOutcome,
    SessionConfig, SessionOptions, TradeParameters,
};
use sizelab_core::format::format_value;

use crate::persistence::PersistedState;

/// Longest the event loop blocks waiting for input.
pub const FRAME_TIMEOUT: Duration = Duration::from_millis(50);

/// Parameter form rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamField {
    Entry,
    Stop,
    Leverage,
    Side,
}

impl ParamField {
    pub fn label(self) -> &'static str {
        match self {
            ParamField::Entry => "Entry",
            ParamField::Stop => "Stop Loss",
            ParamField::Leverage => "Leverage",
            ParamField::Side => "Side",
        }
    }
}

/// Which input has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Param(ParamField),
    Metric(MetricField),
}

pub const FOCUS_ORDER: [Focus; 8] = [
    Focus::Param(ParamField::Entry),
    Focus::Param(ParamField::Stop),
    Focus::Param(ParamField::Leverage),
    Focus::Param(ParamField::Side),
    Focus::Metric(MetricField::Margin),
    Focus::Metric(MetricField::PositionSize),
    Focus::Metric(MetricField::Quantity),
    Focus::Metric(MetricField::OneR),
];

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
}

/// Raw text of the parameter form.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamForm {
    pub entry: String,
    pub stop: String,
    pub leverage: String,
    pub side: PositionType,
}

impl ParamForm {
    pub fn text_mut(&mut self, field: ParamField) -> Option<&mut String> {
        match field {
            ParamField::Entry => Some(&mut self.entry),
            ParamField::Stop => Some(&mut self.stop),
            ParamField::Leverage => Some(&mut self.leverage),
            ParamField::Side => None,
        }
    }

    pub fn text(&self, field: ParamField) -> String {
        match field {
            ParamField::Entry => self.entry.clone(),
            ParamField::Stop => self.stop.clone(),
            ParamField::Leverage => self.leverage.clone(),
            ParamField::Side => self.side.label().to_string(),
        }
    }

    /// Unparseable text becomes 0, which the session treats as missing data.
    pub fn to_parameters(&self) -> TradeParameters {
        let num = |s: &str| sizelab_core::format::parse_amount(s).unwrap_or(0.0);
        TradeParameters::new(num(&self.entry), num(&self.stop), num(&self.leverage), self.side)
    }
}

/// Receives the session's commit notifications until the next tick drains them.
#[derive(Debug, Default)]
pub struct CommitInbox {
    latest: Option<PositionMetrics>,
    total: usize,
}

impl CommitInbox {
    pub fn take(&mut self) -> Option<PositionMetrics> {
        self.latest.take()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl CommitSink for CommitInbox {
    fn on_commit(&mut self, metrics: &PositionMetrics) {
        self.latest = Some(*metrics);
        self.total += 1;
    }
}

pub struct AppState {
    pub running: bool,
    pub focus_idx: usize,
    pub form: ParamForm,
    pub session: EditSession<CommitInbox>,
    pub last_commit: Option<PositionMetrics>,
    pub portfolio_value: f64,
    pub r_percent: f64,
    pub status_message: Option<(String, StatusLevel)>,
}

impl AppState {
    pub fn new(persisted: &PersistedState, config: &SessionConfig) -> Self {
        let form = ParamForm {
            entry: persisted.entry_price.clone(),
            stop: persisted.stop_loss.clone(),
            leverage: persisted.leverage.clone(),
            side: persisted.position_type,
        };
        let params = form.to_parameters();
        let initial = persisted
            .metrics
            .or_else(|| plan::suggest_metrics(persisted.portfolio_value, persisted.r_percent, &params).ok())
            .unwrap_or_default();

        let session = EditSession::new(
            params,
            initial,
            config,
            SessionOptions { label: Some("Position".into()), disabled: false },
            CommitInbox::default(),
        );

        Self {
            running: true,
            focus_idx: FOCUS_ORDER.len() - 4,
            form,
            session,
            last_commit: persisted.metrics,
            portfolio_value: persisted.portfolio_value,
            r_percent: persisted.r_percent,
            status_message: None,
        }
    }

    pub fn focus(&self) -> Focus {
        FOCUS_ORDER[self.focus_idx]
    }

    pub fn focus_next(&mut self) {
        self.focus_idx = (self.focus_idx + 1) % FOCUS_ORDER.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus_idx = (self.focus_idx + FOCUS_ORDER.len() - 1) % FOCUS_ORDER.len();
    }

    // ── Typing ─────────────────────────────────────────────────────────

    pub fn type_char(&mut self, c: char, now: Instant) {
        match self.focus() {
            Focus::Param(field) => {
                if let Some(text) = self.form.text_mut(field) {
                    text.push(c);
                    self.params_changed();
                }
            }
            Focus::Metric(field) => {
                let mut text = self.session.display(field).to_string();
                text.push(c);
                self.edit_metric(field, text, now);
            }
        }
    }

    pub fn backspace(&mut self, now: Instant) {
        match self.focus() {
            Focus::Param(field) => {
                if let Some(text) = self.form.text_mut(field) {
                    text.pop();
                    self.params_changed();
                }
            }
            Focus::Metric(field) => {
                let mut text = self.session.display(field).to_string();
                text.pop();
                self.edit_metric(field, text, now);
            }
        }
    }

    pub fn clear_field(&mut self, now: Instant) {
        match self.focus() {
            Focus::Param(field) => {
                if let Some(text) = self.form.text_mut(field) {
                    text.clear();
                    self.params_changed();
                }
            }
            Focus::Metric(field) => self.edit_metric(field, String::new(), now),
        }
    }

    pub fn toggle_side(&mut self) {
        self.form.side = self.form.side.flipped();
        self.params_changed();
    }

    fn edit_metric(&mut self, field: MetricField, text: String, now: Instant) {
        match self.session.edit(field, text, now) {
            Ok(()) => {}
            Err(EditRejected::MissingData) => {
                self.set_warning("Enter a valid entry, stop, and leverage first");
            }
            Err(EditRejected::Disabled) => self.set_warning("Editing is disabled"),
        }
    }

    // ── Host pushes ────────────────────────────────────────────────────

    /// Push the form to the session, then re-derive metrics at the same 1R.
    fn params_changed(&mut self) {
        let params = self.form.to_parameters();
        self.session.push_parameters(params);
        if !params.is_valid() {
            return;
        }
        let one_r = self
            .last_commit
            .map(|m| m.one_r)
            .or_else(|| plan::risk_budget(self.portfolio_value, self.r_percent).ok());
        if let Some(metrics) = one_r.and_then(|r| formula::from_one_r(r, &params).ok()) {
            self.push_metrics(metrics);
        }
    }

    /// Seed the fields from the risk plan.
    pub fn apply_plan(&mut self) {
        let params = self.form.to_parameters();
        match plan::suggest_metrics(self.portfolio_value, self.r_percent, &params) {
            Ok(metrics) => {
                if self.push_metrics(metrics) == PushOutcome::Applied {
                    self.set_status(format!(
                        "Plan applied: 1R = {:.2} ({:.2}% of {:.2})",
                        metrics.one_r,
                        self.r_percent * 100.0,
                        self.portfolio_value
                    ));
                } else {
                    self.set_warning("Edit in progress; plan not applied");
                }
            }
            Err(e) => self.set_warning(format!("Cannot plan: {e}")),
        }
    }

    /// Applied pushes become the current sizing.
    fn push_metrics(&mut self, metrics: PositionMetrics) -> PushOutcome {
        let outcome = self.session.push_metrics(metrics);
        debug!(?outcome, "metrics pushed to session");
        if outcome == PushOutcome::Applied {
            self.last_commit = Some(metrics);
        }
        outcome
    }

    // ── Timer ──────────────────────────────────────────────────────────

    /// How long the event loop may wait for input before the next tick.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        match self.session.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now).min(FRAME_TIMEOUT),
            None => FRAME_TIMEOUT,
        }
    }

    /// Fire the session's pending commit if due.
    pub fn tick(&mut self, now: Instant) {
        self.session.poll(now);
        let Some(metrics) = self.session.sink_mut().take() else {
            return;
        };
        self.last_commit = Some(metrics);
        info!(commit = self.commit_count(), "sizing committed");

        let precision = *self.session.precision();
        let parts = MetricField::ALL.map(|field| {
            format!("{} {}", field.label(), format_value(field, metrics.get(field), &precision))
        });
        self.set_status(format!("Committed: {}", parts.join(" | ")));
    }

    pub fn commit_count(&self) -> usize {
        self.session.sink().total()
    }

    // ── Status ─────────────────────────────────────────────────────────

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    /// Tear the session down and capture what should survive a restart.
    pub fn into_persisted(self) -> PersistedState {
        let AppState { form, session, last_commit, portfolio_value, r_percent, .. } = self;
        session.teardown();
        PersistedState {
            entry_price: form.entry,
            stop_loss: form.stop,
            leverage: form.leverage,
            position_type: form.side,
            portfolio_value,
            r_percent,
            metrics: last_commit,
            saved_at: Some(chrono::Utc::now()),
        }
    }
}
