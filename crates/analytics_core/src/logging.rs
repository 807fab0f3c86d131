//! Logging setup
//!
//! The core itself only emits `tracing` events. Hosts that don't install
//! their own subscriber can call [`setup_logging`] once at startup.

use crate::config::Config;
use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber from the client configuration.
///
/// `RUST_LOG` overrides [`Config::log_level`] when set. Fails if a global
/// subscriber was already installed.
pub fn setup_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()?;
    }

    Ok(())
}
