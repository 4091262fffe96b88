//! Phase-completion notification sink.

use crate::timer::Phase;

/// Invoked exactly once per phase completion (natural or skipped) and once
/// per completed-while-away restore. Implementations must not block the
/// caller on anything slow.
pub trait Notify {
    fn phase_completed(&self, completed: Phase, next: Phase);
    fn completed_while_away(&self, phase: Phase);
}

/// Terminal sink: a message plus an optional ASCII bell.
pub struct TerminalNotifier {
    pub bell: bool,
}

impl Notify for TerminalNotifier {
    fn phase_completed(&self, completed: Phase, next: Phase) {
        let bell = if self.bell { "\x07" } else { "" };
        println!("{bell}{completed} complete -- up next: {next}");
    }

    fn completed_while_away(&self, phase: Phase) {
        let bell = if self.bell { "\x07" } else { "" };
        println!("{bell}{phase} finished while the timer was closed");
    }
}

/// Discards all notifications. Used when notifications are disabled.
pub struct NullNotifier;

impl Notify for NullNotifier {
    fn phase_completed(&self, _completed: Phase, _next: Phase) {}
    fn completed_while_away(&self, _phase: Phase) {}
}
