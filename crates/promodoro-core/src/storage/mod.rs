mod config;
mod kv;

pub use config::Config;
pub use kv::{MemoryKv, PersistentKv, Store};

use std::path::PathBuf;

/// Returns `~/.config/promodoro[-dev]/` based on PROMODORO_ENV.
///
/// Set PROMODORO_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PROMODORO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("promodoro-dev")
    } else {
        base_dir.join("promodoro")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
