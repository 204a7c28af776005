use std::collections::BTreeMap;

use async_trait::async_trait;

use super::provider::{PaginationStyle, SiteAdapter, child_href};
use crate::scraper::browser::{BrowserSession, PageElement};
use crate::scraper::error::{ScrapeError, ScrapeResult};
use crate::scraper::normalizer::{NormalizeContext, cartesian, clean_text, normalize_multi, split_multi};
use crate::scraper::record::{JobRecord, NOT_AVAILABLE, RawListing};

const ENTRY_URL: &str = "https://careers.wipro.com/search/?q=&locationsearch=india&searchResultView=LIST&pageNumber=0&facetFilters=%7B%7D&sortBy=&markerViewed=&carouselIndex=";
const ROW: &str = "li[data-testid=\"jobCard\"]";
const TITLE: &str = "a.jobCardTitle";
const TITLE_FALLBACK: &str = "a";
const FOOTER_VALUE: &str = "span.JobsList_jobCardFooterValue__Lc--j";
const FOOTER_FALLBACK: &str = "span";
const NEXT_PAGE: &str = "button[data-testid=\"goToNextPageBtn\"]";
const COOKIE_BANNER: &str = ".cookiePolicy.cookiemanager";
const COOKIE_ACCEPT: &str = "#cookie-accept";

const FIELD_CITY: &str = "city";
const FIELD_STATE: &str = "state";
const FIELD_COUNTRY: &str = "country";
const FIELD_CATEGORY: &str = "category";
const DETAILS_PLACEHOLDER: &str = "Visit link";

/// Wipro's search results render job cards directly in the page. Each card
/// footer lists id, cities, states, country and category in that order.
#[derive(Debug, Default)]
pub struct Wipro;

impl Wipro {
    pub fn new() -> Self {
        Self
    }

    async fn footer_values(row: &dyn PageElement) -> ScrapeResult<Vec<String>> {
        let mut spans = row.find_all(FOOTER_VALUE).await?;
        if spans.is_empty() {
            spans = row.find_all(FOOTER_FALLBACK).await?;
        }
        let mut values = Vec::with_capacity(spans.len());
        for span in spans {
            let text = span.text().await?;
            let text = text.trim();
            if !text.is_empty() {
                values.push(text.to_string());
            }
        }
        Ok(values)
    }

    fn base_record(&self, raw: &RawListing, ctx: &NormalizeContext) -> JobRecord {
        let mut extras = BTreeMap::new();
        extras.insert(
            "Country".to_string(),
            raw.field(FIELD_COUNTRY).unwrap_or_default().to_string(),
        );
        JobRecord {
            title: raw.title.clone(),
            location: NOT_AVAILABLE.to_string(),
            company: self.company().to_string(),
            category: raw.field(FIELD_CATEGORY).map(str::to_string),
            link: raw.link.clone().unwrap_or_else(|| ctx.page_url.clone()),
            responsibilities: DETAILS_PLACEHOLDER.to_string(),
            qualifications: DETAILS_PLACEHOLDER.to_string(),
            scraped_at: ctx.scraped_at.clone(),
            native_id: raw.native_id.clone(),
            extras,
        }
    }
}

fn with_place(mut record: JobRecord, city: String, state: String) -> JobRecord {
    if !city.is_empty() {
        record.location = city.clone();
    }
    record.extras.insert("City".to_string(), city);
    record.extras.insert("State".to_string(), state);
    record
}

#[async_trait]
impl SiteAdapter for Wipro {
    fn id(&self) -> &'static str {
        "wipro"
    }

    fn company(&self) -> &'static str {
        "Wipro"
    }

    fn entry_url(&self) -> &'static str {
        ENTRY_URL
    }

    fn row_selector(&self) -> &'static str {
        ROW
    }

    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::NextButton {
            selector: NEXT_PAGE,
        }
    }

    async fn prepare_page(&self, session: &dyn BrowserSession) -> ScrapeResult<()> {
        for banner in session.find_all(COOKIE_BANNER).await? {
            if !banner.is_displayed().await? {
                continue;
            }
            if let Some(accept) = banner.find(COOKIE_ACCEPT).await? {
                accept.click().await?;
                tracing::debug!("Dismissed cookie banner");
            }
        }
        Ok(())
    }

    async fn read_row(&self, index: usize, row: &dyn PageElement) -> ScrapeResult<RawListing> {
        let anchor = match row.find(TITLE).await? {
            Some(a) => Some(a),
            None => row.find(TITLE_FALLBACK).await?,
        };
        let anchor = anchor.ok_or_else(|| ScrapeError::element_read(index, "no title link"))?;
        let title = clean_text(&anchor.text().await?);
        if title.is_empty() {
            return Err(ScrapeError::element_read(index, "empty title"));
        }

        let values = Self::footer_values(row).await?;
        let job_id = values.first().cloned().unwrap_or_default();
        if job_id.is_empty() || !job_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ScrapeError::element_read(
                index,
                format!("job id '{}' is not numeric", job_id),
            ));
        }
        let value = |i: usize| values.get(i).cloned().unwrap_or_default();

        let mut raw = RawListing::new(title)
            .with_field(FIELD_CITY, value(1))
            .with_field(FIELD_STATE, value(2))
            .with_field(FIELD_COUNTRY, value(3))
            .with_field(FIELD_CATEGORY, value(4));
        raw.native_id = Some(job_id);
        raw.link = match anchor.attribute("href").await? {
            Some(href) if !href.trim().is_empty() => Some(href.trim().to_string()),
            _ => child_href(row, "a[href]").await?,
        };
        Ok(raw)
    }

    fn normalize(&self, raw: &RawListing, ctx: &NormalizeContext) -> Vec<JobRecord> {
        let raw_city = raw.field(FIELD_CITY).unwrap_or_default();
        let raw_state = raw.field(FIELD_STATE).unwrap_or_default();
        let cities = split_multi(raw_city);
        let states = split_multi(raw_state);

        if ctx.options.expand_multi && !cities.is_empty() && !states.is_empty() {
            return cartesian(&cities, &states)
                .into_iter()
                .map(|(city, state)| with_place(self.base_record(raw, ctx), city, state))
                .collect();
        }

        vec![with_place(
            self.base_record(raw, ctx),
            normalize_multi(raw_city),
            normalize_multi(raw_state),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::normalizer::NormalizeOptions;
    use crate::scraper::testing::FakeElement;

    fn ctx(expand_multi: bool) -> NormalizeContext {
        NormalizeContext {
            options: NormalizeOptions { expand_multi },
            scraped_at: "2024-05-01T10:00:00Z".into(),
            page_url: ENTRY_URL.into(),
        }
    }

    fn card(id: &str, city: &str, state: &str) -> FakeElement {
        FakeElement::new(ROW)
            .child(
                FakeElement::new(TITLE)
                    .also(TITLE_FALLBACK)
                    .text("Java Developer")
                    .attr("href", "https://careers.wipro.com/job/1"),
            )
            .child(FakeElement::new(FOOTER_VALUE).text(id))
            .child(FakeElement::new(FOOTER_VALUE).text(city))
            .child(FakeElement::new(FOOTER_VALUE).text(state))
            .child(FakeElement::new(FOOTER_VALUE).text("India"))
            .child(FakeElement::new(FOOTER_VALUE).text("Engineering"))
    }

    #[tokio::test]
    async fn test_read_row_extracts_footer() {
        let raw = Wipro
            .read_row(0, &card("3012", "Pune, Mumbai", "Maharashtra"))
            .await
            .unwrap();
        assert_eq!(raw.title, "Java Developer");
        assert_eq!(raw.native_id.as_deref(), Some("3012"));
        assert_eq!(raw.field(FIELD_CITY), Some("Pune, Mumbai"));
        assert_eq!(raw.field(FIELD_CATEGORY), Some("Engineering"));
        assert_eq!(raw.link.as_deref(), Some("https://careers.wipro.com/job/1"));
    }

    #[tokio::test]
    async fn test_read_row_rejects_non_numeric_id() {
        let err = Wipro
            .read_row(2, &card("REQ-1", "Pune", "Maharashtra"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::ElementRead { index: 2, .. }));
    }

    #[test]
    fn test_normalize_joins_multi_values() {
        let raw = RawListing::new("Java Developer")
            .with_field(FIELD_CITY, "Pune, Mumbai")
            .with_field(FIELD_STATE, "Maharashtra");
        let records = Wipro.normalize(&raw, &ctx(false));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].extras["City"], "Pune; Mumbai");
        assert_eq!(records[0].extras["State"], "Maharashtra");
        assert_eq!(records[0].location, "Pune; Mumbai");
    }

    #[test]
    fn test_normalize_expands_when_requested() {
        let raw = RawListing::new("Java Developer")
            .with_field(FIELD_CITY, "Pune, Mumbai")
            .with_field(FIELD_STATE, "Maharashtra; Goa");
        let records = Wipro.normalize(&raw, &ctx(true));
        let places: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.extras["City"].as_str(), r.extras["State"].as_str()))
            .collect();
        assert_eq!(
            places,
            vec![
                ("Pune", "Maharashtra"),
                ("Pune", "Goa"),
                ("Mumbai", "Maharashtra"),
                ("Mumbai", "Goa")
            ]
        );
    }

    #[test]
    fn test_expand_without_states_falls_back_to_single_row() {
        let raw = RawListing::new("Java Developer").with_field(FIELD_CITY, "Pune, Mumbai");
        let records = Wipro.normalize(&raw, &ctx(true));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].extras["State"], "");
    }

    #[test]
    fn test_missing_city_keeps_na_location() {
        let raw = RawListing::new("Java Developer");
        assert_eq!(Wipro.normalize(&raw, &ctx(false))[0].location, "N/A");
    }
}
