use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scraper::JobRecord;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Error => write!(f, "error"),
        }
    }
}

/// Full state of one task slot. Only the task's own run mutates it.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub id: Uuid,
    pub site: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub message: String,
    pub records: Arc<Vec<JobRecord>>,
    pub created_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

impl TaskState {
    pub fn new(id: Uuid, site: &str) -> Self {
        Self {
            id,
            site: site.to_string(),
            status: TaskStatus::Running,
            progress: 0,
            message: "Task started".to_string(),
            records: Arc::new(Vec::new()),
            created_at: Timestamp::now(),
            finished_at: None,
        }
    }

    /// Record a progress checkpoint. Ignored once terminal; progress never
    /// moves backwards. Returns whether the state changed.
    pub fn advance(&mut self, percent: u8, message: &str) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let progress = self.progress.max(percent.min(100));
        if progress == self.progress && message == self.message {
            return false;
        }
        self.progress = progress;
        self.message = message.to_string();
        true
    }

    pub fn complete(&mut self, records: Vec<JobRecord>, message: String) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.message = message;
        self.records = Arc::new(records);
        self.finished_at = Some(Timestamp::now());
        true
    }

    /// Mark the task failed. Progress stays where the run left it.
    pub fn fail(&mut self, message: String) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Error;
        self.message = message;
        self.records = Arc::new(Vec::new());
        self.finished_at = Some(Timestamp::now());
        true
    }

    pub fn view(&self) -> TaskView {
        TaskView {
            task_id: self.id,
            site: self.site.clone(),
            status: self.status,
            progress: self.progress,
            message: self.message.clone(),
            record_count: self.records.len(),
            records: (self.status == TaskStatus::Completed).then(|| self.records.to_vec()),
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }
}

/// Snapshot handed to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub task_id: Uuid,
    pub site: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub message: String,
    pub record_count: usize,
    /// Present only once the task has completed.
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<JobRecord>>,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
}
