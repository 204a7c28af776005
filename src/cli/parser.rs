//! CLI argument parsing with clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Career-site job scraper with an HTTP task API
#[derive(Parser, Debug)]
#[command(name = "hunthq")]
#[command(about = "Scrape job listings from company career sites")]
#[command(long_about = "
HuntHQ drives a headless Chrome through company career pages, follows their
pagination and exports the listings as CSV. Run it as an HTTP service or as
a one-shot command.

EXAMPLES:
    # Start the server with default configuration
    hunthq serve

    # Bind to all interfaces on a custom port
    hunthq serve --host 0.0.0.0 --port 8080

    # Check configuration without starting the server
    hunthq serve --dry-run

    # Scrape one site and write the CSV next to you
    hunthq scrape wipro --output wipro.csv

    # One record per city/state combination, with a visible browser
    hunthq scrape wipro --expand-multi --headed

    # List supported sites
    hunthq sites
")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load exactly this TOML file instead of the layered `config/` directory.
    /// `HUNTHQ_*` environment variables still apply on top.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects the `config/{environment}.toml` overlay.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    ///
    /// Examples:
    ///   hunthq serve                           # Start with defaults
    ///   hunthq serve --host 0.0.0.0 --port 80 # Bind to all interfaces on port 80
    ///   hunthq serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override for this server instance
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },

    /// Scrape one site now and write its listings as CSV
    ///
    /// Progress is printed while the browser works through the result pages.
    ///
    /// Examples:
    ///   hunthq scrape swiggy
    ///   hunthq scrape wipro --expand-multi --output jobs.csv
    Scrape {
        /// Site identifier (see `hunthq sites`)
        #[arg(value_parser = super::validation::validate_site_name)]
        site: String,

        /// Emit one record per (city, state) combination
        #[arg(long)]
        expand_multi: bool,

        /// CSV destination; defaults to `jobs_<timestamp>.csv` in the
        /// current directory
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,
    },

    /// List the supported sites
    Sites,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Checks clap cannot express on its own.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Scrape {
            output: Some(path), ..
        }) = &self.command
            && path.is_dir()
        {
            return Err(format!(
                "Output path '{}' is a directory; pass a file name",
                path.display()
            ));
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
