use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ScrapeError;

/// Placeholder used for canonical text fields a site does not expose.
pub const NOT_AVAILABLE: &str = "N/A";

const FINGERPRINT_SEPARATOR: &str = "\u{1f}";

/// Site-independent job record. The named fields are the minimum every
/// adapter guarantees; anything else a site exposes goes into `extras`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub location: String,
    pub company: String,
    pub category: Option<String>,
    pub link: String,
    pub responsibilities: String,
    pub qualifications: String,
    pub scraped_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl JobRecord {
    /// Flatten into ordered `(column, value)` pairs for tabular export.
    pub fn to_row(&self) -> Vec<(String, String)> {
        let mut row = vec![
            ("Scraped At".to_string(), self.scraped_at.clone()),
            ("Role".to_string(), self.title.clone()),
            ("Location".to_string(), self.location.clone()),
            ("Company".to_string(), self.company.clone()),
            (
                "Category".to_string(),
                self.category.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            ("Job Link".to_string(), self.link.clone()),
            ("Responsibilities".to_string(), self.responsibilities.clone()),
            ("Qualifications".to_string(), self.qualifications.clone()),
        ];
        if let Some(id) = &self.native_id {
            row.push(("Job ID".to_string(), id.clone()));
        }
        row.extend(self.extras.iter().map(|(k, v)| (k.clone(), v.clone())));
        row
    }
}

/// Fields read from one listing element before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    pub title: String,
    pub native_id: Option<String>,
    pub link: Option<String>,
    /// Optional site-specific values keyed by the adapter's field names.
    pub fields: BTreeMap<String, String>,
}

impl RawListing {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.fields.insert(key.to_string(), value);
        }
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Identity of the listing on the page, used for stall detection.
    /// Without a native id every raw value takes part, so two postings that
    /// share a title but differ in location stay distinct.
    pub fn fingerprint(&self) -> String {
        if let Some(id) = &self.native_id {
            return format!("id:{id}");
        }
        let mut parts = vec![
            self.title.clone(),
            self.link.clone().unwrap_or_default(),
        ];
        parts.extend(self.fields.iter().map(|(k, v)| format!("{k}={v}")));
        parts.join(FINGERPRINT_SEPARATOR)
    }
}

/// Result of reading one listing element.
#[derive(Debug)]
pub enum RowOutcome {
    Listing(RawListing),
    Skipped(ScrapeError),
}
