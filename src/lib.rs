//! hunthq
//!
//! Paginated job-listing scraper driven through a headless browser, with a
//! background task orchestrator, CSV export and an HTTP API on top.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod scraper;
pub mod server;
pub mod state;
pub mod tasks;
pub mod utils;

pub use state::AppState;
