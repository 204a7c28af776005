//! Browser automation capability consumed by the scrape engine.
//!
//! The engine only talks to these traits; `chromium` provides the production
//! implementation and `testing` a scripted in-memory one.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::error::{ScrapeError, ScrapeResult};

/// One DOM element handle inside the current page or frame.
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Rendered text, untrimmed. Empty when the element has no text.
    async fn text(&self) -> ScrapeResult<String>;

    async fn attribute(&self, name: &str) -> ScrapeResult<Option<String>>;

    /// First descendant matching `css`, or `None`.
    async fn find(&self, css: &str) -> ScrapeResult<Option<Box<dyn PageElement>>>;

    async fn find_all(&self, css: &str) -> ScrapeResult<Vec<Box<dyn PageElement>>>;

    async fn is_displayed(&self) -> ScrapeResult<bool>;

    async fn click(&self) -> ScrapeResult<()>;
}

/// A live browser session. Exactly one exists per scrape run.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn open(&self, url: &str) -> ScrapeResult<()>;

    async fn find_all(&self, css: &str) -> ScrapeResult<Vec<Box<dyn PageElement>>>;

    /// Make the document hosted by `frame` the active browsing context.
    async fn switch_into(&self, frame: &dyn PageElement) -> ScrapeResult<()>;

    async fn current_url(&self) -> ScrapeResult<String>;

    async fn close(&self) -> ScrapeResult<()>;
}

/// Launches browser sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn launch(&self) -> ScrapeResult<Box<dyn BrowserSession>>;
}

/// Poll `probe` every `poll` until it yields a value or `timeout` elapses.
///
/// Probe errors are treated as "not ready yet"; the last one is logged when
/// the wait gives up. Returns `None` on timeout.
pub async fn wait_until<T, F, Fut>(timeout: Duration, poll: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ScrapeResult<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    let mut last_error = None;
    loop {
        match probe().await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => last_error = Some(e),
        }
        if Instant::now() >= deadline {
            if let Some(e) = last_error {
                tracing::debug!(error = %e, "Wait expired after probe error");
            }
            return None;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Wait until at least one element matches `css`.
pub async fn wait_for_elements(
    session: &dyn BrowserSession,
    css: &str,
    timeout: Duration,
    poll: Duration,
) -> ScrapeResult<Vec<Box<dyn PageElement>>> {
    wait_until(timeout, poll, || async move {
        let found = session.find_all(css).await?;
        Ok::<_, ScrapeError>((!found.is_empty()).then_some(found))
    })
    .await
    .ok_or_else(|| ScrapeError::ElementTimeout {
        selector: css.to_string(),
        waited: timeout,
    })
}
