//! Scripted session replay on a virtual clock.
//!
//! A script seeds one [`EditSession`] and then applies timed steps. Deadlines
//! that fall before a step fire first, at their own timestamp, so the output
//! matches what an interactive editor would have done.
//!
//! ```toml
//! label = "Planned"
//!
//! [parameters]
//! entry_price = 100.0
//! stop_loss = 95.0
//! leverage = 10.0
//! position_type = "LONG"
//!
//! [initial]
//! margin = 100.0
//! position_size = 1000.0
//! quantity = 10.0
//! one_r = 50.0
//!
//! [[steps]]
//! action = "edit"
//! at_ms = 0
//! field = "margin"
//! text = "1000"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use sizelab_core::{
    CommitLog, CommitOutcome, EditSession, MetricField, PositionMetrics, PushOutcome,
    SessionConfig, SessionOptions, SessionState, TradeParameters,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    pub parameters: TradeParameters,
    #[serde(default)]
    pub initial: PositionMetrics,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Edit { at_ms: u64, field: MetricField, text: String },
    PushMetrics { at_ms: u64, metrics: PositionMetrics },
    PushParameters { at_ms: u64, parameters: TradeParameters },
    Teardown { at_ms: u64 },
}

impl Step {
    fn at_ms(&self) -> u64 {
        match self {
            Step::Edit { at_ms, .. }
            | Step::PushMetrics { at_ms, .. }
            | Step::PushParameters { at_ms, .. }
            | Step::Teardown { at_ms } => *at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Committed { at_ms: u64, field: MetricField, metrics: PositionMetrics },
    Skipped { at_ms: u64, field: MetricField, reason: String },
    EditRejected { at_ms: u64, field: MetricField, reason: String },
    PushDeferred { at_ms: u64, kind: &'static str },
    TornDown { at_ms: u64, cancelled_pending: bool },
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub label: Option<String>,
    pub events: Vec<ReplayEvent>,
    pub commits: usize,
    /// `None` once the session has been torn down.
    pub final_state: Option<SessionState>,
    pub final_display: BTreeMap<String, String>,
}

impl ReplayScript {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let script: ReplayScript = toml::from_str(content).context("failed to parse script")?;
        let mut last = 0;
        for (i, step) in script.steps.iter().enumerate() {
            if step.at_ms() < last {
                bail!(
                    "step {} at {}ms goes back in time (previous step at {}ms)",
                    i + 1,
                    step.at_ms(),
                    last
                );
            }
            last = step.at_ms();
        }
        Ok(script)
    }
}

/// Run the script and collect everything the host would have observed.
pub fn run(script: &ReplayScript, config: &SessionConfig) -> Result<ReplayReport> {
    let base = Instant::now();
    let mut session = Some(EditSession::new(
        script.parameters,
        script.initial,
        config,
        SessionOptions { label: script.label.clone(), disabled: script.disabled },
        CommitLog::default(),
    ));
    let mut events = Vec::new();
    let mut torn_down_display = None;

    for step in &script.steps {
        let Some(s) = session.as_mut() else {
            bail!("step at {}ms comes after teardown", step.at_ms());
        };
        let now = base + Duration::from_millis(step.at_ms());
        fire_due(s, base, now, &mut events);

        match step {
            Step::Edit { at_ms, field, text } => {
                if let Err(rejected) = s.edit(*field, text.as_str(), now) {
                    events.push(ReplayEvent::EditRejected {
                        at_ms: *at_ms,
                        field: *field,
                        reason: rejected.to_string(),
                    });
                }
            }
            Step::PushMetrics { at_ms, metrics } => {
                if s.push_metrics(*metrics) == PushOutcome::Deferred {
                    events.push(ReplayEvent::PushDeferred { at_ms: *at_ms, kind: "metrics" });
                }
            }
            Step::PushParameters { at_ms, parameters } => {
                if s.push_parameters(*parameters) == PushOutcome::Deferred {
                    events.push(ReplayEvent::PushDeferred { at_ms: *at_ms, kind: "parameters" });
                }
            }
            Step::Teardown { at_ms } => {
                torn_down_display = Some(display_map(s.display_values()));
                let cancelled_pending = s.is_pending();
                if let Some(s) = session.take() {
                    s.teardown();
                }
                events.push(ReplayEvent::TornDown { at_ms: *at_ms, cancelled_pending });
            }
        }
    }

    let (commits, final_state, final_display) = match session {
        Some(mut s) => {
            if let Some(deadline) = s.next_deadline() {
                fire_due(&mut s, base, deadline, &mut events);
            }
            let display = display_map(s.display_values());
            (s.sink().commits.len(), Some(s.state()), display)
        }
        None => {
            let committed = events
                .iter()
                .filter(|e| matches!(e, ReplayEvent::Committed { .. }))
                .count();
            (committed, None, torn_down_display.unwrap_or_default())
        }
    };

    info!(commits, events = events.len(), "replay finished");
    Ok(ReplayReport { label: script.label.clone(), events, commits, final_state, final_display })
}

fn fire_due(
    session: &mut EditSession<CommitLog>,
    base: Instant,
    now: Instant,
    events: &mut Vec<ReplayEvent>,
) {
    let Some(deadline) = session.next_deadline().filter(|d| *d <= now) else {
        return;
    };
    let Some(field) = session.authority() else {
        return;
    };
    let at_ms = deadline.duration_since(base).as_millis() as u64;
    match session.poll_outcome(deadline) {
        Some(CommitOutcome::Committed(metrics)) => {
            events.push(ReplayEvent::Committed { at_ms, field, metrics })
        }
        Some(CommitOutcome::Skipped(reason)) => {
            events.push(ReplayEvent::Skipped { at_ms, field, reason: reason.to_string() })
        }
        None => {}
    }
}

fn display_map(values: &[String; 4]) -> BTreeMap<String, String> {
    MetricField::ALL
        .iter()
        .zip(values.iter())
        .map(|(field, text)| (field.label().to_string(), text.clone()))
        .collect()
}
