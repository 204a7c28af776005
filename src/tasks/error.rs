use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Scraper for \"{site}\" not available yet. Currently supported: {supported}")]
    UnsupportedSite { site: String, supported: String },

    #[error("Invalid task ID: {0}")]
    UnknownTask(Uuid),

    #[error("No data available for task {0}")]
    EmptyResult(Uuid),

    #[error("Failed to export results of task {task_id}")]
    Export {
        task_id: Uuid,
        #[source]
        source: anyhow::Error,
    },
}

pub type TaskResult<T> = Result<T, TaskError>;
