//! Page extractor: turns the listing elements currently on screen into
//! per-row outcomes. Never paginates.

use futures::stream::{self, Stream, StreamExt};

use super::browser::{BrowserSession, PageElement};
use super::error::ScrapeResult;
use super::record::RowOutcome;
use super::sites::SiteAdapter;

/// Lazily read every element in `rows`. A row that fails to read becomes
/// [`RowOutcome::Skipped`] and the stream moves on to the next one.
pub fn extract_rows<'a>(
    adapter: &'a dyn SiteAdapter,
    rows: Vec<Box<dyn PageElement>>,
) -> impl Stream<Item = RowOutcome> + Send + 'a {
    stream::iter(rows.into_iter().enumerate()).then(move |(index, row)| async move {
        match adapter.read_row(index, row.as_ref()).await {
            Ok(listing) => RowOutcome::Listing(listing),
            Err(e) => {
                tracing::warn!(site = adapter.id(), index, error = %e, "Skipping listing element");
                RowOutcome::Skipped(e)
            }
        }
    })
}

/// Snapshot the current page's listing elements and extract them.
///
/// Only the lookup of the rows themselves can fail; a page with no rows is
/// an empty result.
pub async fn extract_page(
    session: &dyn BrowserSession,
    adapter: &dyn SiteAdapter,
) -> ScrapeResult<Vec<RowOutcome>> {
    let rows = session.find_all(adapter.row_selector()).await?;
    tracing::debug!(site = adapter.id(), rows = rows.len(), "Found listing elements");
    Ok(extract_rows(adapter, rows).collect().await)
}
