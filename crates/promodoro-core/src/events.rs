use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{ActiveTask, Phase};

/// Every state transition in the engine produces an Event.
///
/// The engine itself performs no I/O: the caller driving `tick()` matches on
/// the returned events and dispatches side effects (notification, persistence,
/// productive-time logging). Side-effect failures never feed back into the
/// state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran to completion (naturally or via skip). The notification
    /// sink fires exactly once per occurrence of this event.
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        completed_focus_sessions: u32,
        at: DateTime<Utc>,
    },
    /// A persisted phase expired while the app was closed.
    CompletedWhileAway {
        phase: Phase,
        at: DateTime<Utc>,
    },
    /// Manual phase selection. Always a full reset of the target phase.
    PhaseSwitched {
        from: Phase,
        to: Phase,
        at: DateTime<Utc>,
    },
    /// A persisted mid-flight record was adopted and the countdown resumed.
    TimerRestored {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TaskSelected {
        task_id: String,
        project_id: Option<String>,
        at: DateTime<Utc>,
    },
    TaskCleared {
        at: DateTime<Utc>,
    },
    /// A closed productive-time interval, attributed to a project.
    /// Dispatch is fire-and-forget; a failed upload is logged and dropped.
    ProductiveFlushed {
        task_id: String,
        project_id: String,
        seconds: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        running: bool,
        remaining_secs: u64,
        duration_secs: u64,
        completed_focus_sessions: u32,
        sessions_until_long_break: u32,
        progress: f64,
        active_task: Option<ActiveTask>,
        at: DateTime<Utc>,
    },
}
