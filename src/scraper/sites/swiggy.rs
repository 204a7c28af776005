use async_trait::async_trait;

use super::provider::{PaginationStyle, SiteAdapter, child_href, child_text};
use crate::scraper::browser::PageElement;
use crate::scraper::error::{ScrapeError, ScrapeResult};
use crate::scraper::normalizer::{NormalizeContext, clean_text};
use crate::scraper::record::{JobRecord, NOT_AVAILABLE, RawListing};

const ENTRY_URL: &str = "https://careers.swiggy.com/#/careers";
const FRAME: &str = "#mnhembedded";
const ROW: &str = "tr.mnh-jobs-table-row";
const TITLE: &str = "span.mnh_req_title";
const LOCATION: &str = "span.mnh_location";
const LINK: &str = "a[href]";
const PAGE_LINK: &str = "a";

const FIELD_LOCATION: &str = "location";
const DETAILS_PLACEHOLDER: &str = "Visit link";

/// Swiggy's careers page embeds a third-party job table in an iframe and
/// paginates it with numbered links.
#[derive(Debug, Default)]
pub struct Swiggy;

impl Swiggy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SiteAdapter for Swiggy {
    fn id(&self) -> &'static str {
        "swiggy"
    }

    fn company(&self) -> &'static str {
        "Swiggy"
    }

    fn entry_url(&self) -> &'static str {
        ENTRY_URL
    }

    fn frame_selector(&self) -> Option<&'static str> {
        Some(FRAME)
    }

    fn row_selector(&self) -> &'static str {
        ROW
    }

    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::Numbered {
            link_selector: PAGE_LINK,
        }
    }

    async fn read_row(&self, index: usize, row: &dyn PageElement) -> ScrapeResult<RawListing> {
        let title = child_text(row, TITLE)
            .await?
            .ok_or_else(|| ScrapeError::element_read(index, "no title"))?;

        let mut raw = RawListing::new(clean_text(&title));
        if let Some(location) = child_text(row, LOCATION).await? {
            raw = raw.with_field(FIELD_LOCATION, location);
        }
        raw.link = child_href(row, LINK).await?;
        Ok(raw)
    }

    fn normalize(&self, raw: &RawListing, ctx: &NormalizeContext) -> Vec<JobRecord> {
        let link = raw.link.clone().unwrap_or_else(|| ctx.page_url.clone());
        vec![JobRecord {
            title: raw.title.clone(),
            location: raw
                .field(FIELD_LOCATION)
                .map(clean_text)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            company: self.company().to_string(),
            category: None,
            link,
            responsibilities: DETAILS_PLACEHOLDER.to_string(),
            qualifications: DETAILS_PLACEHOLDER.to_string(),
            scraped_at: ctx.scraped_at.clone(),
            native_id: raw.native_id.clone(),
            extras: Default::default(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::normalizer::NormalizeOptions;
    use crate::scraper::testing::FakeElement;

    fn ctx() -> NormalizeContext {
        NormalizeContext {
            options: NormalizeOptions::default(),
            scraped_at: "2024-05-01T10:00:00Z".into(),
            page_url: ENTRY_URL.into(),
        }
    }

    #[tokio::test]
    async fn test_read_row_requires_title() {
        let row = FakeElement::new("tr").child(FakeElement::new(LOCATION).text("Bangalore"));
        let err = Swiggy.read_row(4, &row).await.unwrap_err();
        assert!(matches!(err, ScrapeError::ElementRead { index: 4, .. }));
    }

    #[tokio::test]
    async fn test_missing_location_becomes_na() {
        let row = FakeElement::new("tr").child(FakeElement::new(TITLE).text(" Data Scientist "));
        let raw = Swiggy.read_row(0, &row).await.unwrap();
        let records = Swiggy.normalize(&raw, &ctx());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Data Scientist");
        assert_eq!(records[0].location, "N/A");
        assert_eq!(records[0].link, ENTRY_URL);
    }

    #[tokio::test]
    async fn test_row_link_is_used_when_present() {
        let row = FakeElement::new("tr")
            .child(FakeElement::new(TITLE).text("SDE II"))
            .child(FakeElement::new(LOCATION).text("Bangalore"))
            .child(FakeElement::new(LINK).attr("href", "https://jobs.example/42"));
        let raw = Swiggy.read_row(0, &row).await.unwrap();
        let record = &Swiggy.normalize(&raw, &ctx())[0];
        assert_eq!(record.location, "Bangalore");
        assert_eq!(record.link, "https://jobs.example/42");
        assert_eq!(record.company, "Swiggy");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = RawListing::new("SDE II").with_field(FIELD_LOCATION, "Bangalore");
        assert_eq!(Swiggy.normalize(&raw, &ctx()), Swiggy.normalize(&raw, &ctx()));
    }
}
