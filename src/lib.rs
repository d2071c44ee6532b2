//! actuator: action registry and dispatch engine for browser-driving agents.
//!
//! This library crate re-exports modules so integration tests
//! (under `tests/`) can access them.

pub mod actions;
pub mod cli;
pub mod config;

/// Return the actuator home directory.
///
/// Resolution order:
/// 1. `ACTUATOR_HOME` environment variable
/// 2. `$HOME/.actuator`
pub fn actuator_home() -> std::path::PathBuf {
    if let Ok(p) = std::env::var("ACTUATOR_HOME") {
        std::path::PathBuf::from(p)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join(".actuator")
    }
}
