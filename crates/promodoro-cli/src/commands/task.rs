//! Task selection commands.
//!
//! Productive time is attributed to the selected task's project. Selection
//! changes go through the engine so an open attribution interval is flushed
//! before the switch.

use chrono::Utc;
use clap::Subcommand;
use promodoro_core::timer::{clear_selection, load_selection, save_selection};

use super::Context;

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks from the server
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Select the task productive time is attributed to
    Select {
        /// Task ID
        id: String,
    },
    /// Drop the current selection
    Clear,
    /// Print the stored selection
    Current,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::init()?;

    match action {
        TaskAction::List { json } => {
            let tasks = ctx.rt.block_on(ctx.api.fetch_tasks())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                for task in &tasks {
                    let mark = if task.is_completed { "x" } else { " " };
                    let project = task
                        .project
                        .as_deref()
                        .map(|p| format!(" (project {p})"))
                        .unwrap_or_default();
                    println!("[{mark}] {} {}{project}", task.id, task.title);
                }
            }
        }
        TaskAction::Select { id } => {
            let tasks = ctx.rt.block_on(ctx.api.fetch_tasks())?;
            let task = tasks
                .iter()
                .find(|t| t.id == id)
                .ok_or_else(|| format!("no task with id '{id}'"))?;
            if task.is_completed {
                return Err(format!("task '{id}' is already completed").into());
            }

            let notifier = ctx.notifier();
            let now = Utc::now();
            let (mut engine, mut events) = ctx.load_engine(now)?;
            let selection = task.to_selection();
            events.extend(engine.select_task(selection.clone(), now));
            save_selection(&selection, &ctx.store)?;
            ctx.dispatch(&engine, &events, notifier.as_ref())?;

            if selection.project_id.is_some() {
                println!("tracking '{}'", task.title);
            } else {
                println!(
                    "tracking '{}' (no project, so no time will be logged)",
                    task.title
                );
            }
        }
        TaskAction::Clear => {
            let notifier = ctx.notifier();
            let now = Utc::now();
            let (mut engine, mut events) = ctx.load_engine(now)?;
            events.extend(engine.clear_task(now));
            clear_selection(&ctx.store)?;
            ctx.dispatch(&engine, &events, notifier.as_ref())?;
            println!("selection cleared");
        }
        TaskAction::Current => match load_selection(&ctx.store)? {
            Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
            None => println!("no task selected"),
        },
    }
    Ok(())
}
