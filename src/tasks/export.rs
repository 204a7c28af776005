//! CSV materialization of task results.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use jiff::Zoned;

use crate::scraper::JobRecord;

/// Where finished exports are kept on disk, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub persist: bool,
    pub directory: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            persist: false,
            directory: PathBuf::from("exports"),
        }
    }
}

/// CSV bytes plus the name a download should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub rows: usize,
}

/// `jobs_YYYYmmdd_HHMMSS.csv` in local time.
pub fn download_name() -> String {
    format!("jobs_{}.csv", Zoned::now().strftime("%Y%m%d_%H%M%S"))
}

/// Render records as CSV. The header is the union of every record's
/// columns in first-seen order; cells a record lacks are left empty.
pub fn render_csv(records: &[JobRecord]) -> anyhow::Result<Vec<u8>> {
    let rows: Vec<Vec<(String, String)>> = records.iter().map(JobRecord::to_row).collect();

    let mut seen = HashSet::new();
    let mut columns: Vec<&str> = Vec::new();
    for row in &rows {
        for (column, _) in row {
            if seen.insert(column.as_str()) {
                columns.push(column);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in &rows {
        let cells = columns.iter().map(|column| {
            row.iter()
                .find(|(name, _)| name.as_str() == *column)
                .map(|(_, value)| value.as_str())
                .unwrap_or("")
        });
        writer.write_record(cells)?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Write an export next to earlier ones, returning the file path.
pub async fn persist(directory: &Path, stem: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(directory).await?;
    let path = directory.join(format!("jobs_{stem}.csv"));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
