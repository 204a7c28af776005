pub mod error;
pub mod export;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use error::{TaskError, TaskResult};
pub use export::{ExportOptions, TabularExport};
pub use orchestrator::TaskOrchestrator;
pub use store::{TaskSlot, TaskStore};
pub use types::{TaskState, TaskStatus, TaskView};
