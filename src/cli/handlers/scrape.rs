//! One-shot scrape command handler
//!
//! Submits a single task, prints its progress as it changes and writes the
//! CSV once it completes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::scraper::{ChromiumDriver, NormalizeOptions, SiteRegistry};
use crate::tasks::{TaskOrchestrator, TaskState, TaskStatus};

/// What a finished one-shot run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub task_id: Uuid,
    pub records: usize,
    /// `None` when the run found nothing to write
    pub output: Option<PathBuf>,
}

pub struct ScrapeCommandHandler {
    orchestrator: TaskOrchestrator,
}

impl ScrapeCommandHandler {
    pub fn new(orchestrator: TaskOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let driver = Arc::new(ChromiumDriver::new(settings.scraper.chromium_options()));
        Self::new(TaskOrchestrator::new(
            SiteRegistry::with_defaults(),
            driver,
            settings.scraper.scrape_options(),
            settings.export.export_options(),
        ))
    }

    pub async fn execute(
        &self,
        site: &str,
        normalize: NormalizeOptions,
        output: Option<&Path>,
    ) -> AppResult<ScrapeSummary> {
        let task_id = self.orchestrator.submit(site, normalize)?;
        println!("Scraping {site} (task {task_id})");

        let state = self.follow(task_id).await?;
        match state.status {
            TaskStatus::Error => Err(AppError::Internal {
                source: anyhow::anyhow!("Scrape of {site} failed: {}", state.message),
            }),
            _ if state.records.is_empty() => {
                println!("{}", state.message);
                Ok(ScrapeSummary {
                    task_id,
                    records: 0,
                    output: None,
                })
            }
            _ => {
                let export = self.orchestrator.materialize(task_id).await?;
                let path = output
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(&export.file_name));
                tokio::fs::write(&path, &export.bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;

                println!("{} Saved to {}", state.message, path.display());
                Ok(ScrapeSummary {
                    task_id,
                    records: export.rows,
                    output: Some(path),
                })
            }
        }
    }

    /// Print each distinct progress update until the task is terminal.
    async fn follow(&self, task_id: Uuid) -> AppResult<TaskState> {
        let mut rx = self.orchestrator.subscribe(task_id)?;
        let mut printed: Option<(u8, String)> = None;

        loop {
            let state = rx.borrow_and_update().clone();
            let line = (state.progress, state.message.clone());
            if printed.as_ref() != Some(&line) {
                println!("[{:>3}%] {}", line.0, line.1);
                printed = Some(line);
            }
            if state.status.is_terminal() {
                return Ok(state);
            }
            if rx.changed().await.is_err() {
                // Sender gone: whatever it last wrote is final.
                return Ok(rx.borrow().clone());
            }
        }
    }
}
