//! Save/restore of in-flight timer state across sessions.
//!
//! While the countdown is running, every tick durably records the phase,
//! its start instant, and the focus-session count -- never the remaining
//! seconds, which are always re-derived from the wall clock so a stored
//! value can never go stale. A record that expired while the app was closed
//! restores as completed-while-away, not as still running.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::engine::TimerEngine;
use super::phase::Phase;
use super::productive::ActiveTask;
use crate::error::StorageError;
use crate::events::Event;
use crate::preferences::Preferences;
use crate::storage::PersistentKv;

/// KV slot for the running timer record.
pub const TIMER_STATE_KEY: &str = "timer_state";
/// KV slot for the task selection, kept independently of the timer record.
pub const ACTIVE_TASK_KEY: &str = "active_task";

/// The durable form of a running timer. Deliberately minimal: everything
/// else is re-derived from preferences and the wall clock at restore time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTimer {
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub completed_focus_sessions: u32,
}

impl PersistedTimer {
    /// Load the persisted record, treating a corrupt one as absent.
    /// A record that fails to parse is removed so it cannot wedge startup.
    pub fn load(kv: &dyn PersistentKv) -> Result<Option<Self>, StorageError> {
        match kv.get(TIMER_STATE_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(record) => Ok(Some(record)),
                Err(_) => {
                    kv.remove(TIMER_STATE_KEY)?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub fn save(&self, kv: &dyn PersistentKv) -> Result<(), StorageError> {
        let json = serde_json::to_string(self).map_err(|e| StorageError::Encode(e.to_string()))?;
        kv.set(TIMER_STATE_KEY, &json)
    }

    pub fn clear(kv: &dyn PersistentKv) -> Result<(), StorageError> {
        kv.remove(TIMER_STATE_KEY)
    }
}

/// Load the persisted task selection; corrupt records are cleared.
pub fn load_selection(kv: &dyn PersistentKv) -> Result<Option<ActiveTask>, StorageError> {
    match kv.get(ACTIVE_TASK_KEY)? {
        Some(json) => match serde_json::from_str(&json) {
            Ok(task) => Ok(Some(task)),
            Err(_) => {
                kv.remove(ACTIVE_TASK_KEY)?;
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub fn save_selection(task: &ActiveTask, kv: &dyn PersistentKv) -> Result<(), StorageError> {
    let json = serde_json::to_string(task).map_err(|e| StorageError::Encode(e.to_string()))?;
    kv.set(ACTIVE_TASK_KEY, &json)
}

pub fn clear_selection(kv: &dyn PersistentKv) -> Result<(), StorageError> {
    kv.remove(ACTIVE_TASK_KEY)
}

impl TimerEngine {
    /// The record to persist, present only while running.
    pub fn persisted(&self) -> Option<PersistedTimer> {
        self.started_at().map(|started_at| PersistedTimer {
            phase: self.phase(),
            started_at,
            completed_focus_sessions: self.completed_focus_sessions(),
        })
    }

    /// Rebuild an engine from a persisted record.
    ///
    /// The phase duration is reconstructed from the same phase's preference
    /// value. A record with time left resumes running (no user gating); one
    /// whose phase elapsed while the app was closed yields an idle Focus
    /// engine at full duration plus a `CompletedWhileAway` event -- the
    /// caller clears the stored record and notifies.
    pub fn restore(
        prefs: Preferences,
        record: Option<PersistedTimer>,
        now: DateTime<Utc>,
    ) -> (Self, Vec<Event>) {
        let prefs = prefs.normalized();
        let Some(record) = record else {
            return (Self::new(prefs), Vec::new());
        };

        let duration = prefs.duration_for(record.phase);
        let elapsed = (now - record.started_at).num_seconds().max(0) as u64;
        if elapsed < duration {
            let remaining = duration - elapsed;
            let engine = Self::restore_running(
                prefs,
                record.phase,
                record.started_at,
                record.completed_focus_sessions,
                remaining,
            );
            let events = vec![Event::TimerRestored {
                phase: record.phase,
                remaining_secs: remaining,
                at: now,
            }];
            (engine, events)
        } else {
            // The phase finished while we were away. A focus phase still
            // counts toward the long-break cadence.
            let sessions = record.completed_focus_sessions
                + u32::from(record.phase == Phase::Focus);
            let engine = Self::restore_expired(prefs, sessions);
            let events = vec![Event::CompletedWhileAway {
                phase: record.phase,
                at: now,
            }];
            (engine, events)
        }
    }
}
