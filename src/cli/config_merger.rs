//! Merges CLI overrides into file-based configuration.
//!
//! Precedence, highest first: command flags, global flags, `HUNTHQ_*`
//! variables, configuration files.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};
use std::path::Path;

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration, either from one file or from the layered
    /// config directory, for the given environment.
    ///
    /// # Errors
    /// Returns ConfigError if loading or validation fails
    pub fn from_config_path(
        config_path: Option<&Path>,
        environment: Option<Environment>,
    ) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(environment) = environment {
            loader = loader.with_environment(environment);
        }
        if let Some(path) = config_path {
            if !path.is_file() {
                return Err(ConfigError::ValidationError {
                    field: "config_file".to_string(),
                    message: format!("Configuration path is not a file: '{}'", path.display()),
                });
            }
            loader = loader.with_file(path);
        }

        tracing::debug!(environment = %loader.environment(), "Loading configuration");
        Ok(Self::new(loader.load()?))
    }

    /// Apply CLI overrides on top of the base configuration and re-validate.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            apply_command_overrides(&mut config, command);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

fn apply_command_overrides(config: &mut Settings, command: &Commands) {
    match command {
        Commands::Serve {
            host,
            port,
            log_level,
            dry_run: _,
        } => {
            if let Some(host_addr) = host {
                config.server.host = host_addr.clone();
            }
            if let Some(port_num) = port {
                config.server.port = *port_num;
            }
            // Command level beats --verbose/--quiet.
            if let Some(level) = log_level {
                config.logger.level = (*level).into();
            }
        }
        Commands::Scrape { headed, .. } => {
            if *headed {
                config.scraper.headless = false;
            }
        }
        Commands::Sites => {}
    }
}
