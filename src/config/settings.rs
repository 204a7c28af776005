//! Configuration settings structures for hunthq
//!
//! Every field has a serde default, so a partial TOML file (or none beyond an
//! empty `default.toml`) still produces a complete [`Settings`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};
use crate::scraper::{ChromiumOptions, NormalizeOptions, PaginationPolicy, ScrapeOptions};
use crate::tasks::ExportOptions;

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "hunthq".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/hunthq.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_user_agent() -> Option<String> {
    Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".to_string())
}

fn default_navigation_timeout() -> u64 {
    60
}

fn default_wait_timeout() -> u64 {
    30
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_max_pages() -> usize {
    200
}

fn default_export_directory() -> String {
    "exports".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds. Scrapes run in the background, so this
    /// only bounds the request handlers themselves.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// ANSI colors; only applied when stdout is a terminal
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// "full", "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// "trace", "debug", "info", "warn" or "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime logger config.
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", e.to_string()))?;

        let config = LoggerConfig {
            level: self.level,
            console: ConsoleConfig {
                enabled: self.console.enabled,
                colored: self.console.colored,
            },
            file: FileConfig {
                enabled: self.file.enabled,
                path: PathBuf::from(self.file.path),
                append: self.file.append,
                format,
            },
        };
        config
            .validate()
            .map_err(|e| ConfigError::validation("logger", e.to_string()))?;
        Ok(config)
    }
}

// ============================================================================
// Scraper Configuration
// ============================================================================

/// Browser and pagination tuning for scrape runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperSettings {
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Chrome binary; auto-detected when unset
    #[serde(default)]
    pub chrome_executable: Option<String>,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: Option<String>,

    /// Seconds allowed for a page navigation
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// Seconds to wait for an embedded listing frame
    #[serde(default = "default_wait_timeout")]
    pub frame_timeout: u64,

    /// Seconds to wait for listing rows after a load or page change
    #[serde(default = "default_wait_timeout")]
    pub row_timeout: u64,

    /// Milliseconds to pause after clicking a pagination control
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: default_user_agent(),
            navigation_timeout: default_navigation_timeout(),
            frame_timeout: default_wait_timeout(),
            row_timeout: default_wait_timeout(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_pages: default_max_pages(),
        }
    }
}

impl ScraperSettings {
    pub fn chromium_options(&self) -> ChromiumOptions {
        ChromiumOptions {
            headless: self.headless,
            executable: self.chrome_executable.as_ref().map(PathBuf::from),
            window_width: self.window_width,
            window_height: self.window_height,
            user_agent: self.user_agent.clone().filter(|ua| !ua.trim().is_empty()),
            navigation_timeout: Duration::from_secs(self.navigation_timeout),
        }
    }

    pub fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            normalize: NormalizeOptions::default(),
            frame_timeout: Duration::from_secs(self.frame_timeout),
            pagination: PaginationPolicy {
                settle_delay: Duration::from_millis(self.settle_delay_ms),
                row_timeout: Duration::from_secs(self.row_timeout),
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                max_pages: self.max_pages,
            },
        }
    }
}

// ============================================================================
// Export Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Also keep every download as `<directory>/jobs_<task_id>.csv`
    #[serde(default)]
    pub persist: bool,

    #[serde(default = "default_export_directory")]
    pub directory: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            persist: false,
            directory: default_export_directory(),
        }
    }
}

impl ExportSettings {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            persist: self.persist,
            directory: PathBuf::from(&self.directory),
        }
    }
}

// ============================================================================
// Root Settings
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub scraper: ScraperSettings,

    #[serde(default)]
    pub export: ExportSettings,
}
