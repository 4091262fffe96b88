mod engine;
mod persist;
mod phase;
mod productive;

pub use engine::TimerEngine;
pub use persist::{
    clear_selection, load_selection, save_selection, PersistedTimer, ACTIVE_TASK_KEY,
    TIMER_STATE_KEY,
};
pub use phase::Phase;
pub use productive::{ActiveTask, MIN_FLUSH_SECS};
