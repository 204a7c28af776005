use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use uuid::Uuid;

use crate::scraper::{JobRecord, ProgressSink};

use super::types::TaskState;

/// In-memory task table. Holds only the read side of every slot; the write
/// side belongs to the run that created it.
#[derive(Clone, Default)]
pub struct TaskStore {
    slots: Arc<DashMap<Uuid, watch::Receiver<TaskState>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new `running` slot and return its writer.
    pub fn create(&self, site: &str) -> TaskSlot {
        let id = Uuid::new_v4();
        let (tx, rx) = watch::channel(TaskState::new(id, site));
        self.slots.insert(id, rx);
        TaskSlot { id, tx }
    }

    pub fn snapshot(&self, id: &Uuid) -> Option<TaskState> {
        self.slots.get(id).map(|rx| rx.borrow().clone())
    }

    pub fn subscribe(&self, id: &Uuid) -> Option<watch::Receiver<TaskState>> {
        self.slots.get(id).map(|rx| rx.clone())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Exclusive writer of one task slot.
pub struct TaskSlot {
    id: Uuid,
    tx: watch::Sender<TaskState>,
}

impl TaskSlot {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn complete(&self, records: Vec<JobRecord>, message: String) {
        self.tx.send_if_modified(|state| state.complete(records, message));
    }

    pub fn fail(&self, message: String) {
        self.tx.send_if_modified(|state| state.fail(message));
    }
}

impl ProgressSink for TaskSlot {
    fn report(&self, percent: u8, message: &str) {
        self.tx
            .send_if_modified(|state| state.advance(percent, message));
    }
}
