use async_trait::async_trait;

use crate::scraper::browser::{BrowserSession, PageElement};
use crate::scraper::error::ScrapeResult;
use crate::scraper::normalizer::NormalizeContext;
use crate::scraper::record::{JobRecord, RawListing};

/// How a site exposes "the next page".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStyle {
    /// Numbered page links; the one reading `current + 1` is clicked.
    Numbered { link_selector: &'static str },
    /// A single directional control that disables itself on the last page.
    NextButton { selector: &'static str },
}

/// Everything the engine needs to know about one career site.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Identifier callers submit, lowercase.
    fn id(&self) -> &'static str;

    fn company(&self) -> &'static str;

    fn entry_url(&self) -> &'static str;

    /// Selector of the iframe hosting the listing widget, if any.
    fn frame_selector(&self) -> Option<&'static str> {
        None
    }

    fn row_selector(&self) -> &'static str;

    fn pagination(&self) -> PaginationStyle;

    /// Clear overlays before a page is read. Runs after the first load and
    /// after every page change; failures are logged, never fatal.
    async fn prepare_page(&self, _session: &dyn BrowserSession) -> ScrapeResult<()> {
        Ok(())
    }

    /// Read one listing element. Errors skip the element.
    async fn read_row(&self, index: usize, row: &dyn PageElement) -> ScrapeResult<RawListing>;

    /// Map a raw listing onto canonical records. Pure.
    fn normalize(&self, raw: &RawListing, ctx: &NormalizeContext) -> Vec<JobRecord>;
}

/// Trimmed text of the first descendant matching `css`, if present and non-empty.
pub(crate) async fn child_text(row: &dyn PageElement, css: &str) -> ScrapeResult<Option<String>> {
    match row.find(css).await? {
        Some(el) => {
            let text = el.text().await?;
            let text = text.trim();
            Ok((!text.is_empty()).then(|| text.to_string()))
        }
        None => Ok(None),
    }
}

/// `href` of the first descendant matching `css`, if any.
pub(crate) async fn child_href(row: &dyn PageElement, css: &str) -> ScrapeResult<Option<String>> {
    match row.find(css).await? {
        Some(el) => Ok(el
            .attribute("href")
            .await?
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())),
        None => Ok(None),
    }
}
