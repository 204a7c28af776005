//! One scrape run against one site.
//!
//! The session owns exactly one browser for its whole lifetime and closes it
//! on every exit path before the outcome is handed back.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use jiff::Zoned;

use super::browser::{BrowserDriver, BrowserSession, wait_for_elements};
use super::error::{ScrapeError, ScrapeResult};
use super::extractor::extract_page;
use super::normalizer::{NormalizeContext, NormalizeOptions};
use super::pagination::{PaginationDriver, PaginationPolicy, PaginationState};
use super::progress::{Checkpoints, ProgressSink};
use super::record::{JobRecord, RawListing, RowOutcome};
use super::sites::SiteAdapter;

const SCRAPED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub normalize: NormalizeOptions,
    /// Bound on waiting for an embedded listing frame.
    pub frame_timeout: Duration,
    pub pagination: PaginationPolicy,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            frame_timeout: Duration::from_secs(30),
            pagination: PaginationPolicy::default(),
        }
    }
}

/// Result of a run. A failed run carries the error and no records; an
/// empty successful run carries neither.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub records: Vec<JobRecord>,
    pub pages: usize,
    pub error: Option<ScrapeError>,
}

impl ScrapeOutcome {
    pub fn success(&self) -> bool {
        !self.records.is_empty()
    }

    fn failed(error: ScrapeError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Closes the browser when dropped without an explicit [`SessionGuard::close`],
/// e.g. when the run future is cancelled. The close is spawned, so nothing
/// waits for it.
struct SessionGuard {
    session: Arc<dyn BrowserSession>,
    site: &'static str,
    closed: bool,
    runtime: tokio::runtime::Handle,
}

impl SessionGuard {
    fn new(session: Box<dyn BrowserSession>, site: &'static str) -> Self {
        Self {
            session: Arc::from(session),
            site,
            closed: false,
            runtime: tokio::runtime::Handle::current(),
        }
    }

    fn session(&self) -> &dyn BrowserSession {
        self.session.as_ref()
    }

    async fn close(mut self) {
        self.closed = true;
        match self.session.close().await {
            Ok(()) => tracing::debug!(site = self.site, "Browser session closed"),
            Err(e) => tracing::warn!(site = self.site, error = %e, "Failed to close browser session"),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let session = Arc::clone(&self.session);
        let site = self.site;
        self.runtime.spawn(async move {
            if let Err(e) = session.close().await {
                tracing::warn!(site, error = %e, "Browser cleanup after abort failed");
            } else {
                tracing::debug!(site, "Browser session closed after abort");
            }
        });
    }
}

pub struct ScrapeSession {
    driver: Arc<dyn BrowserDriver>,
    adapter: Arc<dyn SiteAdapter>,
    options: ScrapeOptions,
}

impl ScrapeSession {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        adapter: Arc<dyn SiteAdapter>,
        options: ScrapeOptions,
    ) -> Self {
        Self {
            driver,
            adapter,
            options,
        }
    }

    /// Run to completion. Never returns an error directly: failures, panics
    /// while driving pages included, end up in [`ScrapeOutcome::error`] after
    /// the browser has been closed.
    pub async fn run(&self, sink: &dyn ProgressSink) -> ScrapeOutcome {
        let site = self.adapter.id();
        let mut checkpoints = Checkpoints::default();
        checkpoints.emit(
            sink,
            5,
            &format!("Starting {} scraper...", self.adapter.company()),
        );

        let guard = match self.driver.launch().await {
            Ok(session) => SessionGuard::new(session, site),
            Err(e) => {
                tracing::error!(site, error = %e, "Failed to launch browser");
                return ScrapeOutcome::failed(e);
            }
        };

        let mut records = Vec::new();
        let result = AssertUnwindSafe(self.drive(
            guard.session(),
            sink,
            &mut checkpoints,
            &mut records,
        ))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            Err(ScrapeError::Crashed {
                message: panic_message(payload.as_ref()),
            })
        });
        guard.close().await;

        match result {
            Ok(pages) => {
                tracing::info!(site, pages, records = records.len(), "Scrape finished");
                checkpoints.emit(sink, 95, &format!("Collected {} jobs", records.len()));
                ScrapeOutcome {
                    records,
                    pages,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(site, error = %e, "Scrape failed");
                ScrapeOutcome::failed(e)
            }
        }
    }

    async fn drive(
        &self,
        session: &dyn BrowserSession,
        sink: &dyn ProgressSink,
        checkpoints: &mut Checkpoints,
        records: &mut Vec<JobRecord>,
    ) -> ScrapeResult<usize> {
        let adapter = self.adapter.as_ref();
        let policy = &self.options.pagination;

        session.open(adapter.entry_url()).await?;
        checkpoints.emit(sink, 10, "Loading careers page...");

        if let Some(selector) = adapter.frame_selector() {
            let frame_missing = || ScrapeError::FrameNotFound {
                selector: selector.to_string(),
                waited: self.options.frame_timeout,
            };
            let frames = wait_for_elements(
                session,
                selector,
                self.options.frame_timeout,
                policy.poll_interval,
            )
            .await
            .map_err(|_| frame_missing())?;
            let frame = frames.into_iter().next().ok_or_else(frame_missing)?;
            session.switch_into(frame.as_ref()).await?;
            checkpoints.emit(sink, 15, "Found job listings frame");
        }

        wait_for_elements(
            session,
            adapter.row_selector(),
            policy.row_timeout,
            policy.poll_interval,
        )
        .await?;
        checkpoints.emit(sink, 20, "Job listings loaded");
        self.prepare(session).await;

        let scraped_at = Zoned::now().strftime(SCRAPED_AT_FORMAT).to_string();
        let mut pager = PaginationDriver::new(adapter.pagination(), policy.clone());

        loop {
            let page = pager.page();
            let outcomes = match extract_page(session, adapter).await {
                Ok(outcomes) => outcomes,
                Err(e) if records.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(site = adapter.id(), page, error = %e, "Stopping at unreadable page");
                    break;
                }
            };

            let total = outcomes.len();
            let listings: Vec<RawListing> = outcomes
                .into_iter()
                .filter_map(|outcome| match outcome {
                    RowOutcome::Listing(listing) => Some(listing),
                    RowOutcome::Skipped(_) => None,
                })
                .collect();
            let fingerprints: Vec<String> = listings.iter().map(RawListing::fingerprint).collect();
            if let Err(e) = pager.observe(fingerprints.iter().map(String::as_str)) {
                tracing::info!(site = adapter.id(), page, reason = %e, "Pagination stalled");
                break;
            }

            // Inside a frame the session sits on the widget document, which is
            // no use as a link; listings there fall back to the careers page.
            let page_url = match adapter.frame_selector() {
                Some(_) => adapter.entry_url().to_string(),
                None => session
                    .current_url()
                    .await
                    .unwrap_or_else(|_| adapter.entry_url().to_string()),
            };
            let ctx = NormalizeContext {
                options: self.options.normalize,
                scraped_at: scraped_at.clone(),
                page_url,
            };
            let before = records.len();
            for listing in &listings {
                if !pager.admit(listing.native_id.as_deref()) {
                    tracing::debug!(site = adapter.id(), id = ?listing.native_id, "Duplicate listing");
                    continue;
                }
                records.extend(adapter.normalize(listing, &ctx));
            }
            tracing::info!(
                site = adapter.id(),
                page,
                added = records.len() - before,
                skipped = total - listings.len(),
                total = records.len(),
                "Scraped page"
            );

            let percent = (25 + page * 10).min(85) as u8;
            checkpoints.emit(
                sink,
                percent,
                &format!("Scraped page {page} ({} jobs so far)", records.len()),
            );

            match pager.advance(session, adapter.row_selector()).await {
                PaginationState::HasMore => self.prepare(session).await,
                PaginationState::Done(reason) => {
                    tracing::debug!(site = adapter.id(), page, ?reason, "Pagination finished");
                    break;
                }
            }
        }

        Ok(pager.page())
    }

    async fn prepare(&self, session: &dyn BrowserSession) {
        if let Err(e) = self.adapter.prepare_page(session).await {
            tracing::warn!(site = self.adapter.id(), error = %e, "Page preparation failed");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
