use std::time::Duration;

use thiserror::Error;

/// Failures raised while driving a browser through a career site.
///
/// `FrameNotFound`, `ElementTimeout`, `BrowserSession` and `Crashed` end a
/// run. `ElementRead` is absorbed by the page extractor and
/// `PaginationStall` by the pagination driver.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Listing frame '{selector}' did not load within {}s", waited.as_secs())]
    FrameNotFound { selector: String, waited: Duration },

    #[error("Elements '{selector}' did not appear within {}s", waited.as_secs())]
    ElementTimeout { selector: String, waited: Duration },

    #[error("Failed to read listing element {index}: {reason}")]
    ElementRead { index: usize, reason: String },

    #[error("Pagination stalled on page {page}: no unseen listings")]
    PaginationStall { page: usize },

    #[error("Browser session error: {message}")]
    BrowserSession {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Scraper crashed: {message}")]
    Crashed { message: String },
}

impl ScrapeError {
    pub fn browser(message: impl Into<String>) -> Self {
        Self::BrowserSession {
            message: message.into(),
            source: None,
        }
    }

    pub fn browser_with(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::BrowserSession {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn element_read(index: usize, reason: impl Into<String>) -> Self {
        Self::ElementRead {
            index,
            reason: reason.into(),
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
