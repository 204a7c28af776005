use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::scraper::{
    BrowserDriver, NormalizeOptions, ScrapeOptions, ScrapeOutcome, ScrapeSession, SiteRegistry,
};

use super::error::{TaskError, TaskResult};
use super::export::{self, ExportOptions, TabularExport};
use super::store::{TaskSlot, TaskStore};
use super::types::{TaskState, TaskStatus, TaskView};

/// Starts scrape runs in the background and answers status and download
/// queries about them.
pub struct TaskOrchestrator {
    registry: SiteRegistry,
    driver: Arc<dyn BrowserDriver>,
    options: ScrapeOptions,
    export: ExportOptions,
    store: TaskStore,
}

impl TaskOrchestrator {
    pub fn new(
        registry: SiteRegistry,
        driver: Arc<dyn BrowserDriver>,
        options: ScrapeOptions,
        export: ExportOptions,
    ) -> Self {
        Self {
            registry,
            driver,
            options,
            export,
            store: TaskStore::new(),
        }
    }

    /// Schedule a scrape of `site` and return its task id immediately.
    /// Unsupported sites are rejected before any slot is allocated.
    pub fn submit(&self, site: &str, normalize: NormalizeOptions) -> TaskResult<Uuid> {
        let adapter = self
            .registry
            .get(site)
            .ok_or_else(|| TaskError::UnsupportedSite {
                site: site.to_string(),
                supported: self.registry.supported().join(", "),
            })?;
        let slot = self.store.create(adapter.id());
        let task_id = slot.id();

        let options = ScrapeOptions {
            normalize,
            ..self.options.clone()
        };
        let session = ScrapeSession::new(Arc::clone(&self.driver), adapter, options);
        tokio::spawn(run_task(session, slot));

        tracing::info!(%task_id, site = %site.trim(), expand_multi = normalize.expand_multi, "Scrape task submitted");
        Ok(task_id)
    }

    pub fn query(&self, task_id: Uuid) -> TaskResult<TaskView> {
        self.state(task_id).map(|state| state.view())
    }

    /// Watch a task's state as it changes.
    pub fn subscribe(&self, task_id: Uuid) -> TaskResult<watch::Receiver<TaskState>> {
        self.store
            .subscribe(&task_id)
            .ok_or(TaskError::UnknownTask(task_id))
    }

    /// Render a completed task's records as CSV.
    pub async fn materialize(&self, task_id: Uuid) -> TaskResult<TabularExport> {
        let state = self.state(task_id)?;
        if state.status != TaskStatus::Completed || state.records.is_empty() {
            return Err(TaskError::EmptyResult(task_id));
        }

        let bytes = export::render_csv(&state.records)
            .map_err(|source| TaskError::Export { task_id, source })?;

        if self.export.persist {
            let path = export::persist(&self.export.directory, &task_id.to_string(), &bytes)
                .await
                .map_err(|source| TaskError::Export { task_id, source })?;
            tracing::info!(%task_id, path = %path.display(), "Export saved");
        }

        Ok(TabularExport {
            file_name: export::download_name(),
            bytes,
            rows: state.records.len(),
        })
    }

    pub fn list_sites(&self) -> Vec<&'static str> {
        self.registry.supported()
    }

    /// Number of tasks tracked since startup.
    pub fn task_count(&self) -> usize {
        self.store.len()
    }

    fn state(&self, task_id: Uuid) -> TaskResult<TaskState> {
        self.store
            .snapshot(&task_id)
            .ok_or(TaskError::UnknownTask(task_id))
    }
}

/// Drive one session to its terminal state. Panics while scraping pages come
/// back from the session as errors once the browser is closed; the run is
/// also spawned separately so a panic anywhere else still lands in the slot.
async fn run_task(session: ScrapeSession, slot: TaskSlot) {
    let task_id = slot.id();
    let slot = Arc::new(slot);
    let sink = Arc::clone(&slot);
    let run = tokio::spawn(async move { session.run(sink.as_ref()).await });

    match run.await {
        Ok(outcome) => finish(&slot, outcome),
        Err(e) => {
            tracing::error!(%task_id, error = %e, "Scrape task aborted");
            slot.fail(format!("Scraper crashed: {e}"));
        }
    }
}

fn finish(slot: &TaskSlot, outcome: ScrapeOutcome) {
    let task_id = slot.id();
    match outcome.error {
        Some(e) => {
            tracing::warn!(%task_id, error = %e, "Scrape task failed");
            slot.fail(e.to_string());
        }
        None if outcome.records.is_empty() => {
            tracing::info!(%task_id, "Scrape task found no jobs");
            slot.complete(Vec::new(), "No jobs found".to_string());
        }
        None => {
            let count = outcome.records.len();
            tracing::info!(%task_id, count, pages = outcome.pages, "Scrape task completed");
            slot.complete(outcome.records, format!("Successfully scraped {count} jobs!"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::scraper::PaginationPolicy;
    use crate::scraper::testing::{FakeDriver, FakeSite, PanickingSite, swiggy_page, wipro_card};

    fn orchestrator(driver: Arc<FakeDriver>, export: ExportOptions) -> TaskOrchestrator {
        TaskOrchestrator::new(SiteRegistry::with_defaults(), driver, options(), export)
    }

    fn options() -> ScrapeOptions {
        ScrapeOptions {
            normalize: NormalizeOptions::default(),
            frame_timeout: Duration::from_millis(40),
            pagination: PaginationPolicy {
                settle_delay: Duration::from_millis(1),
                row_timeout: Duration::from_millis(40),
                poll_interval: Duration::from_millis(5),
                max_pages: 20,
            },
        }
    }

    async fn wait_terminal(orch: &TaskOrchestrator, task_id: Uuid) -> TaskView {
        let mut rx = orch.subscribe(task_id).unwrap();
        let polled = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|state| state.status.is_terminal()),
        )
        .await
        .expect("task did not finish")
        .map(|state| state.view());
        polled.unwrap_or_else(|_| orch.query(task_id).unwrap())
    }

    #[tokio::test]
    async fn test_swiggy_two_pages_complete() {
        let site = FakeSite::swiggy(vec![
            swiggy_page(&["SDE I", "SDE II", "SDE III"]),
            swiggy_page(&["Designer", "Analyst"]),
        ]);
        let orch = orchestrator(Arc::new(FakeDriver::new(site)), ExportOptions::default());

        let task_id = orch.submit("swiggy", NormalizeOptions::default()).unwrap();
        let view = wait_terminal(&orch, task_id).await;

        assert_eq!(view.status, TaskStatus::Completed);
        assert_eq!(view.progress, 100);
        assert_eq!(view.record_count, 5);
        assert_eq!(view.records.as_ref().map(Vec::len), Some(5));
        assert_eq!(view.message, "Successfully scraped 5 jobs!");
    }

    #[tokio::test]
    async fn test_wipro_joins_cities_without_expansion() {
        let site = FakeSite::wipro(vec![vec![wipro_card(
            "4401",
            "Java Developer",
            "Pune, Mumbai",
            "Maharashtra",
        )]]);
        let orch = orchestrator(Arc::new(FakeDriver::new(site)), ExportOptions::default());

        let task_id = orch.submit("wipro", NormalizeOptions::default()).unwrap();
        let view = wait_terminal(&orch, task_id).await;

        let records = view.records.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].extras["City"], "Pune; Mumbai");
        assert_eq!(records[0].extras["State"], "Maharashtra");
    }

    #[tokio::test]
    async fn test_crashed_run_releases_browser_before_error() {
        let driver = Arc::new(FakeDriver::new(FakeSite::numbered(vec![swiggy_page(&["A"])])));
        let mut registry = SiteRegistry::empty();
        registry.register(PanickingSite);
        let orch = TaskOrchestrator::new(
            registry,
            Arc::clone(&driver) as Arc<dyn BrowserDriver>,
            options(),
            ExportOptions::default(),
        );

        let task_id = orch.submit("panicking", NormalizeOptions::default()).unwrap();
        let view = wait_terminal(&orch, task_id).await;

        assert_eq!(view.status, TaskStatus::Error);
        assert_eq!(view.message, "Scraper crashed: adapter bug");
        assert_eq!(driver.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_site_allocates_nothing() {
        let orch = orchestrator(
            Arc::new(FakeDriver::new(FakeSite::numbered(Vec::new()))),
            ExportOptions::default(),
        );
        let err = orch.submit("acme", NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, TaskError::UnsupportedSite { .. }));
        assert!(err.to_string().contains("swiggy, wipro"));
        assert!(orch.store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_frame_errors_and_releases_browser() {
        let site = FakeSite::swiggy(vec![swiggy_page(&["SDE I"])]).frame_never_loads();
        let driver = Arc::new(FakeDriver::new(site));
        let orch = orchestrator(Arc::clone(&driver), ExportOptions::default());

        let task_id = orch.submit("swiggy", NormalizeOptions::default()).unwrap();
        let view = wait_terminal(&orch, task_id).await;

        assert_eq!(view.status, TaskStatus::Error);
        assert!(!view.message.is_empty());
        assert_eq!(view.record_count, 0);
        assert!(view.records.is_none());
        assert_eq!(driver.closed_sessions(), driver.launched_sessions());
        assert!(matches!(
            orch.materialize(task_id).await,
            Err(TaskError::EmptyResult(_))
        ));
    }

    #[tokio::test]
    async fn test_polled_progress_is_monotonic() {
        let pages = (0..4)
            .map(|p| {
                let titles: Vec<String> = (0..3).map(|i| format!("Role {p}-{i}")).collect();
                let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
                swiggy_page(&titles)
            })
            .collect();
        let orch = orchestrator(
            Arc::new(FakeDriver::new(FakeSite::swiggy(pages))),
            ExportOptions::default(),
        );
        let task_id = orch.submit("swiggy", NormalizeOptions::default()).unwrap();

        let mut observed = Vec::new();
        loop {
            let view = orch.query(task_id).unwrap();
            observed.push(view.progress);
            if view.status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(observed.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(observed.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_empty_run_completes_without_data() {
        let site = FakeSite::swiggy(vec![vec![crate::scraper::testing::FakeElement::new(
            crate::scraper::testing::SWIGGY_ROW,
        )]]);
        let orch = orchestrator(Arc::new(FakeDriver::new(site)), ExportOptions::default());

        let task_id = orch.submit("swiggy", NormalizeOptions::default()).unwrap();
        let view = wait_terminal(&orch, task_id).await;

        assert_eq!(view.status, TaskStatus::Completed);
        assert_eq!(view.message, "No jobs found");
        assert_eq!(view.record_count, 0);
    }

    #[tokio::test]
    async fn test_materialize_persists_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let site = FakeSite::swiggy(vec![swiggy_page(&["SDE I", "SDE II"])]);
        let orch = orchestrator(
            Arc::new(FakeDriver::new(site)),
            ExportOptions {
                persist: true,
                directory: dir.path().to_path_buf(),
            },
        );

        let task_id = orch.submit("Swiggy", NormalizeOptions::default()).unwrap();
        wait_terminal(&orch, task_id).await;
        let export = orch.materialize(task_id).await.unwrap();

        assert_eq!(export.rows, 2);
        assert!(export.file_name.starts_with("jobs_"));
        let saved = std::fs::read(dir.path().join(format!("jobs_{task_id}.csv"))).unwrap();
        assert_eq!(saved, export.bytes);
    }

    #[tokio::test]
    async fn test_unknown_task_is_reported() {
        let orch = orchestrator(
            Arc::new(FakeDriver::new(FakeSite::numbered(Vec::new()))),
            ExportOptions::default(),
        );
        let id = Uuid::new_v4();
        assert!(matches!(orch.query(id), Err(TaskError::UnknownTask(got)) if got == id));
        assert!(matches!(
            orch.materialize(id).await,
            Err(TaskError::UnknownTask(_))
        ));
    }
}
