//! Command handlers for CLI operations

pub mod scrape;
pub mod serve;

pub use scrape::{ScrapeCommandHandler, ScrapeSummary};
pub use serve::ServeCommandHandler;
