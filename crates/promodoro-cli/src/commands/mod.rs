pub mod auth;
pub mod config;
pub mod task;
pub mod timer;

use chrono::{DateTime, Utc};
use promodoro_core::timer::load_selection;
use promodoro_core::{
    ApiClient, Config, Event, Notify, NullNotifier, PersistedTimer, Preferences, Store,
    TerminalNotifier, TimerEngine,
};

/// Shared composition for commands that drive the timer engine: the durable
/// store, local configuration, the server client, and a runtime for its
/// async calls.
pub(crate) struct Context {
    pub store: Store,
    pub config: Config,
    pub api: ApiClient,
    pub rt: tokio::runtime::Runtime,
}

impl Context {
    pub fn init() -> Result<Self, Box<dyn std::error::Error>> {
        let store = Store::open()?;
        let config = Config::load_or_default();
        let api = ApiClient::new(&config.api.base_url, promodoro_core::api::load_token())?;
        let rt = tokio::runtime::Runtime::new()?;
        Ok(Self {
            store,
            config,
            api,
            rt,
        })
    }

    /// Server preferences, one-shot with a local fallback. No retry loop:
    /// a failed fetch means this session runs on the configured defaults.
    pub fn preferences(&self) -> Preferences {
        match self.rt.block_on(self.api.fetch_preferences()) {
            Ok(prefs) => prefs,
            Err(e) => {
                eprintln!("warn: preference fetch failed, using local durations: {e}");
                self.config.fallback_preferences()
            }
        }
    }

    /// Rebuild the engine from the persisted slot and stored task selection.
    /// Returns the restore events (resume or completed-while-away) for the
    /// caller to dispatch along with its own.
    pub fn load_engine(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(TimerEngine, Vec<Event>), Box<dyn std::error::Error>> {
        let prefs = self.preferences();
        let record = PersistedTimer::load(&self.store)?;
        let (mut engine, events) = TimerEngine::restore(prefs, record, now);
        engine.adopt_task(load_selection(&self.store)?, now);
        Ok((engine, events))
    }

    pub fn notifier(&self) -> Box<dyn Notify> {
        if self.config.notifications.enabled {
            Box::new(TerminalNotifier {
                bell: self.config.notifications.bell,
            })
        } else {
            Box::new(NullNotifier)
        }
    }

    /// Apply side effects for a batch of events, then sync the persisted
    /// slot to the engine's current state. Productive-time uploads are
    /// fire-and-forget: failures are logged and dropped, never retried,
    /// and never roll back the transition that produced them.
    pub fn dispatch(
        &self,
        engine: &TimerEngine,
        events: &[Event],
        notifier: &dyn Notify,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for event in events {
            match event {
                Event::ProductiveFlushed {
                    project_id,
                    seconds,
                    ..
                } => {
                    let result = self
                        .rt
                        .block_on(self.api.log_project_time(project_id, *seconds));
                    if let Err(e) = result {
                        eprintln!(
                            "warn: dropping productive-time entry ({seconds}s for {project_id}): {e}"
                        );
                    }
                }
                Event::PhaseCompleted {
                    completed, next, ..
                } => notifier.phase_completed(*completed, *next),
                Event::CompletedWhileAway { phase, .. } => notifier.completed_while_away(*phase),
                _ => {}
            }
        }

        match engine.persisted() {
            Some(record) => record.save(&self.store)?,
            None => PersistedTimer::clear(&self.store)?,
        }
        Ok(())
    }
}
