//! Serve command handler
//!
//! Handles the serve command including dry-run validation and server startup.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run the server until shutdown, or only validate when `dry_run` is set.
    pub async fn execute(self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }
        Server::new(self.config).run().await?;
        Ok(())
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        let logger = self.config.logger.clone().into_logger_config()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!(
            "✓ Browser: {} ({}x{})",
            if self.config.scraper.headless { "headless" } else { "headed" },
            self.config.scraper.window_width,
            self.config.scraper.window_height
        );
        println!(
            "✓ Pagination: up to {} pages, {}ms settle delay",
            self.config.scraper.max_pages, self.config.scraper.settle_delay_ms
        );
        if self.config.export.persist {
            println!("✓ Exports are kept in: {}", self.config.export.directory);
        }
        println!(
            "✓ Logger configuration is valid (level {}, file output {})",
            logger.level,
            if logger.file.enabled { "on" } else { "off" }
        );

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
