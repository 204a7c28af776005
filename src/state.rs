//! Application state for Axum web framework.
//!
//! Shared by every request handler; cloning only bumps reference counts.

use std::sync::Arc;

use crate::config::Settings;
use crate::scraper::{ChromiumDriver, SiteRegistry};
use crate::tasks::TaskOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub orchestrator: Arc<TaskOrchestrator>,
}

impl AppState {
    /// Build the production state: headless Chrome plus the built-in site
    /// adapters.
    pub fn new(settings: Settings) -> Self {
        let driver = Arc::new(ChromiumDriver::new(settings.scraper.chromium_options()));
        let orchestrator = TaskOrchestrator::new(
            SiteRegistry::with_defaults(),
            driver,
            settings.scraper.scrape_options(),
            settings.export.export_options(),
        );
        Self::with_orchestrator(settings, orchestrator)
    }

    pub fn with_orchestrator(settings: Settings, orchestrator: TaskOrchestrator) -> Self {
        Self {
            settings: Arc::new(settings),
            orchestrator: Arc::new(orchestrator),
        }
    }
}
