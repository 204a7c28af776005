//! Paginated extraction engine.
//!
//! A [`ScrapeSession`] drives one browser through one career site: the
//! [`sites`] adapter says where listings live, the [`extractor`] reads them,
//! the [`pagination`] driver moves between result pages and the
//! [`normalizer`] turns raw fields into [`JobRecord`]s.

pub mod browser;
pub mod chromium;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod pagination;
pub mod progress;
pub mod record;
pub mod session;
pub mod sites;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::{BrowserDriver, BrowserSession, PageElement};
pub use chromium::{ChromiumDriver, ChromiumOptions};
pub use error::{ScrapeError, ScrapeResult};
pub use normalizer::NormalizeOptions;
pub use pagination::PaginationPolicy;
pub use progress::ProgressSink;
pub use record::JobRecord;
pub use session::{ScrapeOptions, ScrapeOutcome, ScrapeSession};
pub use sites::{SiteAdapter, SiteRegistry};
