//! Configuration validation logic
//!
//! Checks that loaded values are within acceptable ranges before anything is
//! started with them.

use crate::config::error::ConfigError;
use crate::config::settings::{
    ExportSettings, FileSettings, LoggerSettings, ScraperSettings, ServerConfig, Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::validation("server.host", "Host must not be empty."));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "Log file path is required when file logging is enabled.",
            ));
        }

        let format = self.format.to_lowercase();
        if !VALID_LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid values are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Level must be one of trace, debug, info, warn, error
    /// - File path must be set when file output is enabled
    /// - File format must be one of full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid values are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()
    }
}

impl ScraperSettings {
    /// Validate scraper settings
    ///
    /// # Validation Rules
    /// - Every timeout must be greater than 0
    /// - At least one page must be allowed
    /// - Window dimensions must be non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            ("scraper.navigation_timeout", self.navigation_timeout),
            ("scraper.frame_timeout", self.frame_timeout),
            ("scraper.row_timeout", self.row_timeout),
            ("scraper.poll_interval_ms", self.poll_interval_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::validation(field, "Value must be greater than 0."));
            }
        }

        if self.max_pages == 0 {
            return Err(ConfigError::validation(
                "scraper.max_pages",
                "At least one page must be allowed.",
            ));
        }

        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::ValidationError {
                field: "scraper.window_size".to_string(),
                message: format!(
                    "Window size {}x{} is not usable.",
                    self.window_width, self.window_height
                ),
            });
        }

        if let Some(path) = &self.chrome_executable
            && path.trim().is_empty()
        {
            return Err(ConfigError::validation(
                "scraper.chrome_executable",
                "Chrome executable path must not be empty when set.",
            ));
        }

        Ok(())
    }
}

impl ExportSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persist && self.directory.trim().is_empty() {
            return Err(ConfigError::validation(
                "export.directory",
                "Export directory is required when persist is enabled.",
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Validate every section, stopping at the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.scraper.validate()?;
        self.export.validate()?;
        Ok(())
    }
}
