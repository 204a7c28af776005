//! Configuration management for hunthq
//!
//! Layered configuration, lowest to highest priority:
//! 1. `default.toml` - base configuration (required)
//! 2. `{environment}.toml` - environment-specific overrides
//! 3. `local.toml` - local overrides, not committed
//! 4. `HUNTHQ_*` environment variables (`HUNTHQ_SERVER__PORT=8080`)

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    ApplicationConfig, ExportSettings, LoggerSettings, ScraperSettings, ServerConfig, Settings,
};

/// Serializes tests that read or write `HUNTHQ_*` process variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
