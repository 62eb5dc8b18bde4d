mod config;

pub use config::{AvailabilityConfig, Config, GraphConfig, TimezoneConfig, WorkingHours};

use std::path::PathBuf;

/// Returns `~/.config/meetbook[-dev]/` based on MEETBOOK_ENV.
///
/// Set MEETBOOK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("MEETBOOK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("meetbook-dev")
    } else {
        base_dir.join("meetbook")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
