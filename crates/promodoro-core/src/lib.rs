//! # Promodoro Core Library
//!
//! Core business logic for the Promodoro focus timer. All operations are
//! available through a standalone CLI binary; any GUI would be a thin layer
//! over this same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-based state machine. Remaining time is
//!   always derived from the recorded start instant, never decremented, so
//!   throttled or missed ticks cannot introduce drift. The caller passes an
//!   explicit `now` to every command and periodically invokes `tick()`.
//! - **Events**: every transition returns [`Event`]s; the caller dispatches
//!   side effects (notification, persistence, productive-time upload) and
//!   their failures never re-enter the machine.
//! - **Storage**: SQLite-backed key-value slot for in-flight timer state and
//!   TOML-based configuration.
//! - **Api**: REST client for the Promodoro server (preferences, tasks,
//!   project time accounting, login).
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`PersistedTimer`]: durable running-timer record and restore semantics
//! - [`Store`] / [`PersistentKv`]: durable key-value slot
//! - [`Config`]: application configuration management
//! - [`ApiClient`]: server client

pub mod api;
pub mod error;
pub mod events;
pub mod notify;
pub mod preferences;
pub mod storage;
pub mod timer;

pub use api::ApiClient;
pub use error::{ApiError, ConfigError, CoreError, StorageError};
pub use events::Event;
pub use notify::{Notify, NullNotifier, TerminalNotifier};
pub use preferences::Preferences;
pub use storage::{Config, MemoryKv, PersistentKv, Store};
pub use timer::{ActiveTask, PersistedTimer, Phase, TimerEngine};
