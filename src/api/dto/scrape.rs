//! Scrape request/response DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::scraper::NormalizeOptions;

/// Request body for `POST /api/scrape`.
#[derive(Debug, Deserialize, Validate)]
pub struct ScrapeRequest {
    /// Site identifier, e.g. `swiggy` or `wipro`
    #[validate(length(min = 1, max = 64, message = "Company must be between 1 and 64 characters"))]
    pub company: String,

    /// One record per (city, state) pair instead of joined lists
    #[serde(default)]
    pub expand_multi: bool,
}

impl ScrapeRequest {
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            expand_multi: self.expand_multi,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub task_id: Uuid,
    /// Always `"started"`; progress is read from the status endpoint
    pub status: String,
}

impl ScrapeResponse {
    pub fn started(task_id: Uuid) -> Self {
        Self {
            task_id,
            status: "started".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SitesResponse {
    pub sites: Vec<String>,
}
