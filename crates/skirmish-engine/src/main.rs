//! # Skirmish
//!
//! Runs an arena simulation without a window and reports how it went.
//!
//! Usage: `skirmish [config.toml]`. Without an argument the runner reads
//! `skirmish.toml` from the working directory, falling back to defaults.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use skirmish_engine::app;
use skirmish_engine::config::{EngineConfig, CONFIG_FILE};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("skirmish_engine=info".parse()?)
                .add_directive("skirmish_combat=info".parse()?),
        )
        .init();

    info!("Skirmish starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = EngineConfig::load_from(&path);

    let report = app::run(config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!("Skirmish shutdown complete");
    Ok(())
}
