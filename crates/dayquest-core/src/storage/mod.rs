mod config;
pub mod kv;

pub use config::{ChallengeConfig, Config, LedgerBackend, LedgerConfig, RewardsConfig};
pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore};

use std::path::PathBuf;

/// Returns `~/.config/dayquest[-dev]/` based on DAYQUEST_ENV.
///
/// Set DAYQUEST_ENV=dev to use development data directory. DAYQUEST_DATA_DIR
/// overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    if let Some(dir) = std::env::var_os("DAYQUEST_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DAYQUEST_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("dayquest-dev")
    } else {
        base_dir.join("dayquest")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
