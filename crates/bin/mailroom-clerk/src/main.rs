//! Command-line entry point for the mailroom clerk.
//!
//! Loads configuration from arguments, the environment and an optional TOML
//! file, installs logging, and runs one subcommand or the interactive shell.

mod commands;
mod config;

use mailroom_core::control::ClerkControlPlane;
use mailroom_core::store::XmlStore;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{ClerkConfig, ConfigError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClerkConfig::from_args()?;
    init_logging(&config)?;

    let control = ClerkControlPlane::with_store(
        XmlStore::new(config.data_dir.clone()),
        config.stores.clone(),
    );
    commands::run(&config, &control)
}

fn init_logging(config: &ClerkConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_new(&config.log_filter).map_err(|err| ConfigError::InvalidSetting {
            name: "MAILROOM_LOG",
            value: format!("{}: {err}", config.log_filter),
        })?;
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .finish(),
    )?;
    Ok(())
}
