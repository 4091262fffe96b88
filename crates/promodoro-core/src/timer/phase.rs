use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The current mode of the pomodoro cycle. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, Phase::Focus)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "focus" => Ok(Phase::Focus),
            "short-break" | "short_break" | "short" => Ok(Phase::ShortBreak),
            "long-break" | "long_break" | "long" => Ok(Phase::LongBreak),
            other => Err(format!(
                "unknown phase '{other}' (expected focus, short-break, or long-break)"
            )),
        }
    }
}
