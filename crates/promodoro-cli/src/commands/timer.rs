//! Timer control commands.
//!
//! One-shot commands rebuild the engine from the persisted slot, apply the
//! action, dispatch the resulting events, and print a JSON snapshot.
//! `timer run` keeps a foreground tick loop going until Ctrl-C; it is the
//! single authoritative scheduler, and teardown flushes any open
//! productive-time interval before the process exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use promodoro_core::timer::clear_selection;
use promodoro_core::{Notify, Phase, TimerEngine};

use super::Context;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or resume) the countdown
    Start,
    /// Pause the countdown and drop the persisted running record
    Pause,
    /// Force the current phase to complete (no-op unless running)
    Skip,
    /// Switch to a phase: focus, short-break, or long-break (full reset)
    Switch { phase: Phase },
    /// Print the current timer state as JSON
    Status,
    /// Drive the tick loop in the foreground until Ctrl-C
    Run,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::init()?;
    let notifier = ctx.notifier();
    let now = Utc::now();
    let (mut engine, mut events) = ctx.load_engine(now)?;

    match action {
        TimerAction::Start => events.extend(engine.start(now)),
        TimerAction::Pause => events.extend(engine.pause(now)),
        TimerAction::Skip => events.extend(engine.skip(now)),
        TimerAction::Switch { phase } => events.extend(engine.switch_phase(phase, now)),
        // Status still ticks: a phase that expired since the last
        // invocation completes here rather than sitting at zero.
        TimerAction::Status => events.extend(engine.tick(now)),
        TimerAction::Run => return run_loop(ctx, engine, events, notifier),
    }

    ctx.dispatch(&engine, &events, notifier.as_ref())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&engine.snapshot(Utc::now()))?
    );
    Ok(())
}

fn run_loop(
    ctx: Context,
    mut engine: TimerEngine,
    startup: Vec<promodoro_core::Event>,
    notifier: Box<dyn Notify>,
) -> Result<(), Box<dyn std::error::Error>> {
    ctx.dispatch(&engine, &startup, notifier.as_ref())?;
    if !engine.running() {
        let events = engine.start(Utc::now());
        ctx.dispatch(&engine, &events, notifier.as_ref())?;
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&engine.snapshot(Utc::now()))?
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctx.rt.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    // Coarse period: remaining time is derived from the wall clock, so the
    // tick rate only bounds completion latency.
    let period_ms = ctx.config.tick_interval_ms.clamp(100, 5_000);
    let period = std::time::Duration::from_millis(period_ms);
    let ticks_per_refresh = (60_000 / period_ms).max(1);
    let mut ticks: u64 = 0;

    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(period);
        let now = Utc::now();
        let events = engine.tick(now);
        ctx.dispatch(&engine, &events, notifier.as_ref())?;

        ticks += 1;
        if ticks % ticks_per_refresh == 0 {
            refresh_selection(&ctx, &mut engine, notifier.as_ref())?;
        }
    }

    // Teardown: close any open productive interval. The running record
    // stays persisted so the next session resumes mid-phase.
    let events = engine.teardown(Utc::now());
    ctx.dispatch(&engine, &events, notifier.as_ref())?;
    Ok(())
}

/// Re-fetch the task list and drop the selection if its task disappeared
/// or was completed. A failed fetch fails open: silently losing the user's
/// selection is worse than staying stale until the next refresh.
fn refresh_selection(
    ctx: &Context,
    engine: &mut TimerEngine,
    notifier: &dyn Notify,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(active) = engine.active_task().cloned() else {
        return Ok(());
    };
    match ctx.rt.block_on(ctx.api.fetch_tasks()) {
        Ok(tasks) => {
            let still_open = tasks
                .iter()
                .any(|t| t.id == active.id && !t.is_completed);
            if !still_open {
                let events = engine.clear_task(Utc::now());
                clear_selection(&ctx.store)?;
                ctx.dispatch(engine, &events, notifier)?;
                eprintln!("info: selected task is gone or completed, selection cleared");
            }
        }
        Err(e) => {
            eprintln!("warn: task refresh failed, keeping current selection: {e}");
        }
    }
    Ok(())
}
