//! Save sequencing.
//!
//! Saves are fire-and-forget and may overlap: a slow save can finish after a
//! newer one. Each save takes a ticket when it starts; when it completes, it
//! only counts as the plan's saved state if no newer save has started since.
//! The backend is still last-write-wins; the sequencer only stops a stale
//! response from being reported as current.

#[cfg(test)]
#[path = "sequence_test.rs"]
mod sequence_test;

use std::sync::atomic::{AtomicU64, Ordering};

/// Position of one save in the sequence. Later saves get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaveTicket(u64);

impl SaveTicket {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// How a completed save relates to the newest save started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// This was the newest save; the backend now holds this state.
    Saved,
    /// A newer save started while this one was in flight.
    Superseded,
}

#[derive(Debug, Default)]
pub struct SaveSequencer {
    latest: AtomicU64,
}

impl SaveSequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a save and return its ticket.
    pub fn begin(&self) -> SaveTicket {
        SaveTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Classify a completed save.
    #[must_use]
    pub fn finish(&self, ticket: SaveTicket) -> SaveOutcome {
        if self.latest.load(Ordering::SeqCst) == ticket.0 {
            SaveOutcome::Saved
        } else {
            SaveOutcome::Superseded
        }
    }

    /// The newest ticket handed out, if any.
    #[must_use]
    pub fn latest(&self) -> Option<SaveTicket> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            n => Some(SaveTicket(n)),
        }
    }
}
