//! Phase durations and long-break cadence.
//!
//! Preferences come from the server once per engine startup; until (or if)
//! that fetch succeeds, these defaults apply. The engine copies the current
//! phase's duration at phase entry, so changing preferences never reshapes a
//! phase that is already underway.

use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Per-user timer durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub focus_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
    pub sessions_until_long_break: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            sessions_until_long_break: 4,
        }
    }
}

impl Preferences {
    /// Configured duration of a phase, in seconds.
    pub fn duration_for(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Focus => self.focus_secs,
            Phase::ShortBreak => self.short_break_secs,
            Phase::LongBreak => self.long_break_secs,
        }
    }

    /// Clamp values the break routing cannot work with.
    /// `sessions_until_long_break` is a modulus and must be at least 1.
    pub fn normalized(mut self) -> Self {
        if self.sessions_until_long_break == 0 {
            self.sessions_until_long_break = 1;
        }
        self
    }
}
