//! Timer engine implementation.
//!
//! The engine is a wall-clock-based state machine. It holds no threads and
//! performs no I/O -- the caller passes an explicit `now` to every command
//! and is responsible for calling `tick()` periodically. Remaining time is
//! ALWAYS derived from `duration - (now - started_at)`, never decremented,
//! so delayed, missed, or suspended ticks self-correct: the arithmetic never
//! trusts a previous tick's result.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(prefs);
//! let events = engine.start(Utc::now());
//! // In a loop:
//! let events = engine.tick(Utc::now()); // PhaseCompleted on phase end
//! ```

use chrono::{DateTime, Duration, Utc};

use super::phase::Phase;
use super::productive::{ActiveTask, ProductiveWindow};
use crate::events::Event;
use crate::preferences::Preferences;

/// Core timer state machine.
///
/// Phase (`Focus`/`ShortBreak`/`LongBreak`) is orthogonal to `running`.
/// Invariants:
/// - `started_at` is `Some` iff the countdown is advancing.
/// - the productive window is open only while `phase == Focus`, running,
///   and the active task carries a project id.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    prefs: Preferences,
    phase: Phase,
    /// Configured length of the current phase, copied from preferences at
    /// phase entry. Not re-read mid-phase.
    duration_secs: u64,
    /// Wall-clock instant the current run began. `None` when paused/idle.
    started_at: Option<DateTime<Utc>>,
    /// Frozen remaining time, authoritative only while not running.
    remaining_secs: u64,
    /// Fully-completed Focus phases since the engine was created.
    completed_focus_sessions: u32,
    active_task: Option<ActiveTask>,
    productive: ProductiveWindow,
}

impl TimerEngine {
    /// Create an idle engine in the Focus phase at full duration.
    pub fn new(prefs: Preferences) -> Self {
        let prefs = prefs.normalized();
        let duration_secs = prefs.duration_for(Phase::Focus);
        Self {
            prefs,
            phase: Phase::Focus,
            duration_secs,
            started_at: None,
            remaining_secs: duration_secs,
            completed_focus_sessions: 0,
            active_task: None,
            productive: ProductiveWindow::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn completed_focus_sessions(&self) -> u32 {
        self.completed_focus_sessions
    }

    pub fn active_task(&self) -> Option<&ActiveTask> {
        self.active_task.as_ref()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Seconds left in the current phase. Derived from the start instant
    /// while running; the frozen value otherwise.
    pub fn remaining(&self, now: DateTime<Utc>) -> u64 {
        match self.started_at {
            Some(started_at) => {
                let elapsed = (now - started_at).num_seconds().max(0) as u64;
                self.duration_secs.saturating_sub(elapsed)
            }
            None => self.remaining_secs,
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        1.0 - (self.remaining(now) as f64 / self.duration_secs as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            running: self.running(),
            remaining_secs: self.remaining(now),
            duration_secs: self.duration_secs,
            completed_focus_sessions: self.completed_focus_sessions,
            sessions_until_long_break: self.prefs.sessions_until_long_break,
            progress: self.progress(now),
            active_task: self.active_task.clone(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or resume) the countdown. No-op while already running.
    ///
    /// The start instant is back-dated by the already-consumed portion of
    /// the phase, so resuming after a pause keeps the derived remaining
    /// time continuous.
    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.running() {
            return Vec::new();
        }
        let consumed = self.duration_secs.saturating_sub(self.remaining_secs);
        self.started_at = Some(now - Duration::seconds(consumed as i64));
        if self.productive_eligible() {
            self.productive.open(now);
        }
        vec![Event::TimerStarted {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: now,
        }]
    }

    /// Freeze the countdown. No-op while not running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if !self.running() {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.flush_productive(now, &mut events);
        self.remaining_secs = self.remaining(now);
        self.started_at = None;
        events.push(Event::TimerPaused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: now,
        });
        events
    }

    /// Manually select a phase. Always a full, deterministic reset of the
    /// target phase -- switching to the current phase restarts it.
    pub fn switch_phase(&mut self, target: Phase, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        self.flush_productive(now, &mut events);
        let from = self.phase;
        self.started_at = None;
        self.phase = target;
        self.duration_secs = self.prefs.duration_for(target);
        self.remaining_secs = self.duration_secs;
        events.push(Event::PhaseSwitched {
            from,
            to: target,
            at: now,
        });
        events
    }

    /// Force the current phase to complete immediately. No-op while not
    /// running: skipping only acts on a phase that is counted as live.
    pub fn skip(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if !self.running() {
            return Vec::new();
        }
        self.complete_phase(now)
    }

    /// Call periodically. Emits `PhaseCompleted` (and a productive flush,
    /// when one is open) once remaining time reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.running() && self.remaining(now) == 0 {
            self.complete_phase(now)
        } else {
            Vec::new()
        }
    }

    /// Attribute productive time to `task` from here on. Closes the prior
    /// task's window first, then opens a new one if still eligible, so a
    /// mid-session task change flushes exactly one interval and opens
    /// exactly one.
    pub fn select_task(&mut self, task: ActiveTask, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        self.flush_productive(now, &mut events);
        events.push(Event::TaskSelected {
            task_id: task.id.clone(),
            project_id: task.project_id.clone(),
            at: now,
        });
        self.active_task = Some(task);
        if self.productive_eligible() {
            self.productive.open(now);
        }
        events
    }

    /// Drop the task selection, flushing any open window. No-op when no
    /// task is selected.
    pub fn clear_task(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.active_task.is_none() {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.flush_productive(now, &mut events);
        self.active_task = None;
        events.push(Event::TaskCleared { at: now });
        events
    }

    /// Install a previously persisted task selection without emitting
    /// selection events. Used when rebuilding the engine at startup.
    pub fn adopt_task(&mut self, task: Option<ActiveTask>, now: DateTime<Utc>) {
        self.active_task = task;
        if self.productive_eligible() {
            self.productive.open(now);
        }
    }

    /// Flush any open productive interval before the process exits. The
    /// machine state is otherwise untouched, so a running record can still
    /// be persisted for the next session to resume.
    pub fn teardown(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        self.flush_productive(now, &mut events);
        events
    }

    /// Adopt freshly loaded preferences. The current phase's duration is
    /// refreshed only when the phase has not started consuming time --
    /// a phase already underway keeps the duration it entered with.
    pub fn set_preferences(&mut self, prefs: Preferences) {
        let prefs = prefs.normalized();
        let untouched = !self.running() && self.remaining_secs == self.duration_secs;
        self.prefs = prefs;
        if untouched {
            self.duration_secs = self.prefs.duration_for(self.phase);
            self.remaining_secs = self.duration_secs;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Natural or forced completion. Stamps the next phase's start instant
    /// exactly once and keeps the countdown running (auto-continue).
    fn complete_phase(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        // A tick can land well past the boundary (machine suspend, long
        // sleep); productive time stops accruing at the phase's end.
        let cutoff = self
            .started_at
            .map(|started| started + Duration::seconds(self.duration_secs as i64))
            .map_or(now, |end| end.min(now));
        self.flush_productive(cutoff, &mut events);
        let completed = self.phase;
        if completed == Phase::Focus {
            self.completed_focus_sessions += 1;
        }
        let next = self.next_phase();
        events.push(Event::PhaseCompleted {
            completed,
            next,
            completed_focus_sessions: self.completed_focus_sessions,
            at: now,
        });
        self.phase = next;
        self.duration_secs = self.prefs.duration_for(next);
        self.remaining_secs = self.duration_secs;
        self.started_at = Some(now);
        if self.productive_eligible() {
            self.productive.open(now);
        }
        events
    }

    /// Break routing: every Nth completed focus session earns the long
    /// break; any break leads back to Focus.
    fn next_phase(&self) -> Phase {
        match self.phase {
            Phase::Focus => {
                if self.completed_focus_sessions % self.prefs.sessions_until_long_break == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Focus,
        }
    }

    fn productive_eligible(&self) -> bool {
        self.phase == Phase::Focus
            && self.running()
            && self
                .active_task
                .as_ref()
                .is_some_and(|task| task.project_id.is_some())
    }

    fn flush_productive(&mut self, now: DateTime<Utc>, events: &mut Vec<Event>) {
        let Some(seconds) = self.productive.close(now) else {
            return;
        };
        if let Some(task) = &self.active_task {
            if let Some(project_id) = &task.project_id {
                events.push(Event::ProductiveFlushed {
                    task_id: task.id.clone(),
                    project_id: project_id.clone(),
                    seconds,
                    at: now,
                });
            }
        }
    }

    pub(super) fn restore_running(
        prefs: Preferences,
        phase: Phase,
        started_at: DateTime<Utc>,
        completed_focus_sessions: u32,
        remaining: u64,
    ) -> Self {
        let mut engine = Self::new(prefs);
        engine.phase = phase;
        engine.duration_secs = engine.prefs.duration_for(phase);
        engine.remaining_secs = remaining;
        engine.started_at = Some(started_at);
        engine.completed_focus_sessions = completed_focus_sessions;
        engine
    }

    pub(super) fn restore_expired(prefs: Preferences, completed_focus_sessions: u32) -> Self {
        let mut engine = Self::new(prefs);
        engine.completed_focus_sessions = completed_focus_sessions;
        engine
    }

    pub(super) fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn prefs() -> Preferences {
        Preferences {
            focus_secs: 1500,
            short_break_secs: 300,
            long_break_secs: 900,
            sessions_until_long_break: 4,
        }
    }

    fn project_task() -> ActiveTask {
        ActiveTask {
            id: "t1".into(),
            project_id: Some("p1".into()),
        }
    }

    fn after(t0: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
        t0 + Duration::seconds(secs)
    }

    fn flushes(events: &[Event]) -> Vec<(String, u64)> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::ProductiveFlushed {
                    project_id, seconds, ..
                } => Some((project_id.clone(), *seconds)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_runs_at_full_duration() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        assert!(!engine.running());
        let events = engine.start(t0);
        assert!(matches!(events[0], Event::TimerStarted { .. }));
        assert!(engine.running());
        assert_eq!(engine.remaining(t0), 1500);
    }

    #[test]
    fn start_while_running_is_noop() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);
        assert!(engine.start(after(t0, 10)).is_empty());
        assert_eq!(engine.remaining(after(t0, 10)), 1490);
    }

    #[test]
    fn remaining_is_monotone_while_running() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);
        let mut last = engine.remaining(t0);
        for k in 1..200 {
            let r = engine.remaining(after(t0, k * 9));
            assert!(r <= last);
            last = r;
        }
    }

    #[test]
    fn remaining_is_independent_of_tick_count() {
        let t0 = Utc::now();

        let mut quiet = TimerEngine::new(prefs());
        quiet.start(t0);

        let mut noisy = TimerEngine::new(prefs());
        noisy.start(t0);
        for k in 0..1000 {
            noisy.tick(after(t0, k / 10));
        }

        assert_eq!(quiet.remaining(after(t0, 100)), 1400);
        assert_eq!(noisy.remaining(after(t0, 100)), 1400);
    }

    #[test]
    fn remaining_clamps_at_zero() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);
        assert_eq!(engine.remaining(after(t0, 4000)), 0);
    }

    #[test]
    fn backwards_clock_does_not_inflate_remaining() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);
        assert_eq!(engine.remaining(after(t0, -60)), 1500);
    }

    #[test]
    fn pause_freezes_and_start_resumes() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);
        let events = engine.pause(after(t0, 30));
        assert!(matches!(
            events.last(),
            Some(Event::TimerPaused {
                remaining_secs: 1470,
                ..
            })
        ));
        // Frozen while paused, no matter how much wall time passes.
        assert_eq!(engine.remaining(after(t0, 500)), 1470);

        engine.start(after(t0, 1000));
        assert_eq!(engine.remaining(after(t0, 1000)), 1470);
        assert_eq!(engine.remaining(after(t0, 1010)), 1460);
    }

    #[test]
    fn pause_while_idle_is_noop() {
        let mut engine = TimerEngine::new(prefs());
        assert!(engine.pause(Utc::now()).is_empty());
    }

    #[test]
    fn natural_completion_advances_and_keeps_running() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);
        assert!(engine.tick(after(t0, 1499)).is_empty());

        let events = engine.tick(after(t0, 1500));
        assert!(matches!(
            events.last(),
            Some(Event::PhaseCompleted {
                completed: Phase::Focus,
                next: Phase::ShortBreak,
                completed_focus_sessions: 1,
                ..
            })
        ));
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert!(engine.running());
        assert_eq!(engine.remaining(after(t0, 1500)), 300);
    }

    #[test]
    fn break_routing_honors_long_break_cadence() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);

        let mut now = t0;
        let mut breaks = Vec::new();
        // Run eight full phases; every completion auto-starts the next.
        for _ in 0..8 {
            now = now + Duration::seconds(engine.duration_secs() as i64);
            for event in engine.tick(now) {
                if let Event::PhaseCompleted {
                    completed: Phase::Focus,
                    next,
                    ..
                } = event
                {
                    breaks.push(next);
                }
            }
        }
        assert_eq!(
            breaks,
            vec![
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::LongBreak,
            ]
        );
    }

    #[test]
    fn skip_is_noop_while_idle() {
        let mut engine = TimerEngine::new(prefs());
        assert!(engine.skip(Utc::now()).is_empty());
        assert_eq!(engine.completed_focus_sessions(), 0);
    }

    #[test]
    fn skip_counts_as_completion() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);
        let events = engine.skip(after(t0, 60));
        assert!(matches!(
            events.last(),
            Some(Event::PhaseCompleted {
                completed: Phase::Focus,
                ..
            })
        ));
        assert_eq!(engine.completed_focus_sessions(), 1);
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert!(engine.running());
    }

    #[test]
    fn switch_phase_is_a_deterministic_full_reset() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);
        engine.switch_phase(Phase::ShortBreak, after(t0, 10));
        assert!(!engine.running());
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert_eq!(engine.remaining(after(t0, 10)), 300);

        // A second switch to the same phase resets again, identically.
        engine.start(after(t0, 20));
        engine.switch_phase(Phase::ShortBreak, after(t0, 50));
        assert!(!engine.running());
        assert_eq!(engine.remaining(after(t0, 50)), 300);
    }

    #[test]
    fn productive_time_flushes_on_pause() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.select_task(project_task(), t0);
        engine.start(t0);

        let events = engine.pause(after(t0, 30));
        assert_eq!(flushes(&events), vec![("p1".into(), 30)]);

        // No further flush until resumed and paused again.
        assert!(flushes(&engine.pause(after(t0, 40))).is_empty());
        engine.start(after(t0, 100));
        let events = engine.pause(after(t0, 130));
        assert_eq!(flushes(&events), vec![("p1".into(), 30)]);
    }

    #[test]
    fn short_intervals_are_dropped() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.select_task(project_task(), t0);
        engine.start(t0);
        assert!(flushes(&engine.pause(after(t0, 2))).is_empty());
    }

    #[test]
    fn task_without_project_opens_no_window() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.select_task(
            ActiveTask {
                id: "t2".into(),
                project_id: None,
            },
            t0,
        );
        engine.start(t0);
        assert!(flushes(&engine.pause(after(t0, 60))).is_empty());
    }

    #[test]
    fn no_window_during_breaks() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.switch_phase(Phase::ShortBreak, t0);
        engine.select_task(project_task(), t0);
        engine.start(t0);
        assert!(flushes(&engine.pause(after(t0, 60))).is_empty());
    }

    #[test]
    fn task_switch_closes_one_interval_and_opens_one() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.select_task(project_task(), t0);
        engine.start(t0);

        let events = engine.select_task(
            ActiveTask {
                id: "t9".into(),
                project_id: Some("p2".into()),
            },
            after(t0, 40),
        );
        assert_eq!(flushes(&events), vec![("p1".into(), 40)]);

        let events = engine.pause(after(t0, 70));
        assert_eq!(flushes(&events), vec![("p2".into(), 30)]);
    }

    #[test]
    fn clear_task_flushes_and_drops_selection() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.select_task(project_task(), t0);
        engine.start(t0);
        let events = engine.clear_task(after(t0, 25));
        assert_eq!(flushes(&events), vec![("p1".into(), 25)]);
        assert!(engine.active_task().is_none());
        // Nothing left to flush afterwards.
        assert!(flushes(&engine.pause(after(t0, 90))).is_empty());
    }

    #[test]
    fn clear_task_without_selection_is_noop() {
        let mut engine = TimerEngine::new(prefs());
        assert!(engine.clear_task(Utc::now()).is_empty());
    }

    #[test]
    fn completion_flushes_then_reopens_on_next_focus() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.select_task(project_task(), t0);
        engine.start(t0);

        let events = engine.tick(after(t0, 1500));
        assert_eq!(flushes(&events), vec![("p1".into(), 1500)]);

        // Break produces no productive time.
        let events = engine.tick(after(t0, 1800));
        assert!(flushes(&events).is_empty());
        assert_eq!(engine.phase(), Phase::Focus);

        // The reopened window starts at the focus re-entry.
        let events = engine.pause(after(t0, 1830));
        assert_eq!(flushes(&events), vec![("p1".into(), 30)]);
    }

    #[test]
    fn late_completion_caps_attributed_time_at_the_phase_length() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.select_task(project_task(), t0);
        engine.start(t0);

        // First tick lands twice the phase length late, as after a suspend.
        let events = engine.tick(after(t0, 3000));
        assert_eq!(flushes(&events), vec![("p1".into(), 1500)]);
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert!(engine.running());
    }

    #[test]
    fn teardown_flushes_without_stopping() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.select_task(project_task(), t0);
        engine.start(t0);
        let events = engine.teardown(after(t0, 45));
        assert_eq!(flushes(&events), vec![("p1".into(), 45)]);
        assert!(engine.running());
    }

    #[test]
    fn preferences_refresh_only_an_untouched_phase() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(Preferences::default());
        let custom = Preferences {
            focus_secs: 3000,
            ..prefs()
        };
        engine.set_preferences(custom);
        assert_eq!(engine.duration_secs(), 3000);
        assert_eq!(engine.remaining(t0), 3000);

        // Mid-phase, the running duration must not be reshaped.
        engine.start(t0);
        engine.set_preferences(Preferences {
            focus_secs: 60,
            ..prefs()
        });
        assert_eq!(engine.duration_secs(), 3000);
        engine.pause(after(t0, 10));
        engine.set_preferences(Preferences {
            focus_secs: 120,
            ..prefs()
        });
        assert_eq!(engine.remaining(after(t0, 10)), 2990);
    }

    #[test]
    fn snapshot_reports_derived_remaining() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::new(prefs());
        engine.start(t0);
        match engine.snapshot(after(t0, 300)) {
            Event::StateSnapshot {
                phase,
                running,
                remaining_secs,
                progress,
                ..
            } => {
                assert_eq!(phase, Phase::Focus);
                assert!(running);
                assert_eq!(remaining_secs, 1200);
                assert!((progress - 0.2).abs() < 1e-9);
            }
            _ => panic!("expected StateSnapshot"),
        }
    }

    proptest! {
        /// remaining(T0 + k) == max(0, D - k) regardless of tick schedule.
        #[test]
        fn remaining_matches_wall_clock(
            k in 0i64..5_000,
            offsets in proptest::collection::vec(0i64..5_000, 0..64),
        ) {
            let t0 = Utc::now();
            let mut engine = TimerEngine::new(prefs());
            engine.start(t0);
            for off in &offsets {
                engine.tick(after(t0, *off.min(&(k.max(1) - 1))));
            }
            // Ticks strictly before completion never change the derivation.
            if k < 1500 {
                prop_assert_eq!(engine.remaining(after(t0, k)), (1500 - k) as u64);
            }
        }
    }
}
