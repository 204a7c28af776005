//! Data Transfer Objects for API requests and responses.
//!
//! - `scrape` - scrape submission and site listing
//! - `health` - liveness response
//! - `error` - common error response

mod error;
mod health;
mod scrape;

pub use error::ErrorResponse;
pub use health::{HealthResponse, HealthStatus};
pub use scrape::{ScrapeRequest, ScrapeResponse, SitesResponse};
