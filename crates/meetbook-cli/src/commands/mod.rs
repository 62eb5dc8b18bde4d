pub mod auth;
pub mod book;
pub mod check;
pub mod config;
pub mod days;
pub mod slots;

use std::future::Future;

use meetbook_core::{BookingService, Config, GraphClient};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Config from disk with environment overrides applied.
pub fn effective_config() -> Result<Config, Box<dyn std::error::Error>> {
    let path = Config::path()?;
    let mut config = Config::load_from(&path)?;
    config.apply_env();
    config.validate()?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Booking service backed by Microsoft Graph.
pub fn graph_service() -> Result<BookingService<GraphClient>, Box<dyn std::error::Error>> {
    let config = effective_config()?;
    let client = GraphClient::from_config(&config)?;
    Ok(BookingService::new(config, client)?)
}

/// Drive a future to completion on a fresh single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Print `value` as pretty JSON or via `Display`.
pub fn emit<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{value}");
    }
    Ok(())
}
