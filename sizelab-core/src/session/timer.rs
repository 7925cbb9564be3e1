//! Single-slot debounce timer.
//!
//! Holds at most one scheduled commit. Scheduling replaces whatever was
//! pending, so a superseded deadline can never fire. The timer does not
//! sleep; the owner hands it the current time.

use std::time::{Duration, Instant};

use crate::domain::MetricField;

/// A scheduled commit for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub field: MetricField,
    pub deadline: Instant,
    /// Increases with every schedule call; identifies which edit armed it.
    pub ticket: u64,
}

#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    pending: Option<Scheduled>,
    next_ticket: u64,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None, next_ticket: 1 }
    }

    /// Arm the timer for `field`, cancelling any earlier schedule.
    pub fn schedule(&mut self, field: MetricField, now: Instant) -> Scheduled {
        let scheduled = Scheduled { field, deadline: now + self.delay, ticket: self.next_ticket };
        self.next_ticket += 1;
        self.pending = Some(scheduled);
        scheduled
    }

    pub fn cancel(&mut self) -> Option<Scheduled> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<&Scheduled> {
        self.pending.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|s| s.deadline)
    }

    /// Remove and return the schedule if its deadline has been reached.
    pub fn take_due(&mut self, now: Instant) -> Option<Scheduled> {
        if self.pending.is_some_and(|s| now >= s.deadline) {
            self.pending.take()
        } else {
            None
        }
    }
}
