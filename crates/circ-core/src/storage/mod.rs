mod config;
pub mod database;

pub use config::Config;
pub use database::{Database, SessionStore};

use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// Returns `~/.config/circ[-dev]/` based on CIRC_ENV.
///
/// Set CIRC_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CIRC_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("circ-dev")
    } else {
        base_dir.join("circ")
    };

    std::fs::create_dir_all(&dir).map_err(CoreError::Io)?;
    Ok(dir)
}
