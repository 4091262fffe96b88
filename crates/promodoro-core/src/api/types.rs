//! Wire types for the Promodoro server's JSON payloads.
//!
//! Field names follow the server's Mongoose models (`_id`, camelCase), so
//! every DTO here carries serde renames and converts into the core types.

use serde::{Deserialize, Serialize};

use crate::preferences::Preferences;
use crate::timer::ActiveTask;

/// A task as returned by `GET /api/tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(rename = "isCompleted", default)]
    pub is_completed: bool,
    /// Project id, when the task is linked to one.
    #[serde(default)]
    pub project: Option<String>,
}

impl Task {
    pub fn to_selection(&self) -> ActiveTask {
        ActiveTask {
            id: self.id.clone(),
            project_id: self.project.clone(),
        }
    }
}

/// Preferences as returned by `GET /api/preferences`. Values in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesDto {
    #[serde(rename = "focusTime")]
    pub focus_time: u64,
    #[serde(rename = "shortBreakTime")]
    pub short_break_time: u64,
    #[serde(rename = "longBreakTime")]
    pub long_break_time: u64,
    #[serde(rename = "sessionsUntilLongBreak")]
    pub sessions_until_long_break: u32,
}

impl From<PreferencesDto> for Preferences {
    fn from(dto: PreferencesDto) -> Self {
        Preferences {
            focus_secs: dto.focus_time,
            short_break_secs: dto.short_break_time,
            long_break_secs: dto.long_break_time,
            sessions_until_long_break: dto.sessions_until_long_break,
        }
        .normalized()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
