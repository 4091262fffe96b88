//! Productive-time attribution window.
//!
//! A side accounting stream, independent of the phase machine's correctness:
//! it measures wall-clock time spent in a running Focus phase while a
//! project-linked task is selected. The engine opens the window on
//! eligibility entry and closes it on any eligibility-breaking event (pause,
//! phase end, task change or clear, teardown).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intervals shorter than this are dropped on close. Rapid start/pause or
/// task toggles would otherwise spray one-second entries at the server.
pub const MIN_FLUSH_SECS: u64 = 5;

/// The externally selected task productive time is attributed to.
/// Only tasks carrying a `project_id` open an attribution window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTask {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// An open attribution interval. At most one exists at a time.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProductiveWindow {
    opened_at: Option<DateTime<Utc>>,
}

impl ProductiveWindow {
    /// Open the window. A no-op if already open, so the opening instant is
    /// stamped exactly once per eligibility entry.
    pub fn open(&mut self, now: DateTime<Utc>) {
        if self.opened_at.is_none() {
            self.opened_at = Some(now);
        }
    }

    pub fn is_open(&self) -> bool {
        self.opened_at.is_some()
    }

    /// Close the window, returning the elapsed seconds if the interval is
    /// long enough to be worth logging. Always clears the window.
    pub fn close(&mut self, now: DateTime<Utc>) -> Option<u64> {
        let opened_at = self.opened_at.take()?;
        let elapsed = (now - opened_at).num_seconds().max(0) as u64;
        if elapsed < MIN_FLUSH_SECS {
            return None;
        }
        Some(elapsed)
    }
}
