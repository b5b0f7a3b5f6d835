//! Break lifecycle: `Idle -> Active -> {Completed, Cancelled}`.
//!
//! Holds at most one in-progress break. Completing or cancelling while idle
//! does nothing; starting while active replaces the running break.

use crate::{BreakRecord, BreakType, Mood};
use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Debug, Default)]
pub struct BreakSession {
    active: Option<BreakRecord>,
}

impl BreakSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The in-progress break, if any
    pub fn active(&self) -> Option<&BreakRecord> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start a break now. An already running break is dropped without
    /// being recorded.
    pub fn start(&mut self, break_type: BreakType, now: DateTime<Utc>) -> &BreakRecord {
        if let Some(previous) = &self.active {
            tracing::debug!(
                "Replacing in-progress {:?} break {} with a new {:?} break",
                previous.break_type,
                previous.id,
                break_type
            );
        }
        self.active.insert(BreakRecord::start(break_type, now))
    }

    /// Finish the running break. Returns the completed record for the caller
    /// to append to history, or `None` when idle.
    pub fn complete(
        &mut self,
        mood: Mood,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Option<BreakRecord> {
        let Some(record) = self.active.take() else {
            tracing::debug!("complete_break called with no active break, ignoring");
            return None;
        };
        let completed = record.complete(mood, notes, now);
        tracing::debug!(
            "Completed {:?} break {} after {}s",
            completed.break_type,
            completed.id,
            completed.duration(now).num_seconds()
        );
        Some(completed)
    }

    /// Abandon the running break without recording it
    pub fn cancel(&mut self) -> Option<BreakRecord> {
        let cancelled = self.active.take();
        match &cancelled {
            Some(record) => tracing::debug!("Cancelled {:?} break {}", record.break_type, record.id),
            None => tracing::debug!("cancel_break called with no active break, ignoring"),
        }
        cancelled
    }

    /// Live elapsed time of the running break
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.active.as_ref().map(|b| b.duration(now))
    }

    pub(crate) fn clear(&mut self) {
        self.active = None;
    }
}
