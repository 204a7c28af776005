//! Health check DTOs for API responses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    /// ISO 8601 timestamp of the check
    pub timestamp: String,
    /// Registered site identifiers
    pub sites: Vec<String>,
    /// Tasks tracked since startup, finished ones included
    pub tasks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// No site adapters are registered
    Degraded,
}
