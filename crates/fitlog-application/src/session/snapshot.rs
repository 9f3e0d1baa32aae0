//! Snapshot/restore protocol for optimistic mutations.
//!
//! The toggle path mutates in-memory state before its network write
//! resolves. A `DaySnapshot` captures the whole date's routine list
//! beforehand; on synchronization failure it is restored wholesale.
//! The durable progress-cache write deliberately sits outside this
//! transaction boundary and is never rolled back.

use chrono::NaiveDate;
use fitlog_core::session::SessionRoutine;
use std::collections::HashMap;

/// An immutable copy of one date's session routines.
#[derive(Debug, Clone)]
pub(crate) struct DaySnapshot {
    date: NaiveDate,
    routines: Vec<SessionRoutine>,
}

impl DaySnapshot {
    /// Captures the current routine list for a date (empty when the
    /// date has no session yet).
    pub(crate) fn capture(
        sessions: &HashMap<NaiveDate, Vec<SessionRoutine>>,
        date: NaiveDate,
    ) -> Self {
        Self {
            date,
            routines: sessions.get(&date).cloned().unwrap_or_default(),
        }
    }

    /// Restores the captured routine list, discarding every mutation
    /// made to the date since the capture.
    pub(crate) fn restore(self, sessions: &mut HashMap<NaiveDate, Vec<SessionRoutine>>) {
        sessions.insert(self.date, self.routines);
    }
}
