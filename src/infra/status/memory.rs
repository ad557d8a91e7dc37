//! In-memory status bus.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::core::{QueueStatus, StatusSink};
use crate::util::serde::ProjectId;

/// One published snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Event name the snapshot was published under.
    pub event: String,
    /// Project the snapshot is scoped to.
    pub project_id: ProjectId,
    /// The snapshot.
    pub status: QueueStatus,
}

/// Status sink that keeps a bounded history and fans updates out to
/// broadcast subscribers.
pub struct InMemoryStatusBus {
    history: Mutex<VecDeque<StatusUpdate>>,
    max_history: usize,
    tx: broadcast::Sender<StatusUpdate>,
}

impl InMemoryStatusBus {
    /// Create a bus keeping at most `max_history` updates.
    pub fn new(max_history: usize) -> Self {
        let (tx, _) = broadcast::channel(max_history.clamp(1, 1024));
        Self {
            history: Mutex::new(VecDeque::with_capacity(max_history.min(1024))),
            max_history,
            tx,
        }
    }

    /// Receive updates published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.tx.subscribe()
    }

    /// Stored updates, oldest first.
    pub fn history(&self) -> Vec<StatusUpdate> {
        self.history.lock().iter().cloned().collect()
    }

    /// Stored updates for one project, oldest first.
    pub fn updates_for(&self, project_id: &str) -> Vec<StatusUpdate> {
        self.history
            .lock()
            .iter()
            .filter(|u| u.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Most recent snapshot for a project.
    pub fn latest(&self, project_id: &str) -> Option<QueueStatus> {
        self.history
            .lock()
            .iter()
            .rev()
            .find(|u| u.project_id == project_id)
            .map(|u| u.status)
    }
}

impl Default for InMemoryStatusBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl StatusSink for InMemoryStatusBus {
    fn emit(&self, event: &str, project_id: &str, status: &QueueStatus) {
        let update = StatusUpdate {
            event: event.to_owned(),
            project_id: project_id.to_owned(),
            status: *status,
        };
        if self.max_history > 0 {
            let mut history = self.history.lock();
            if history.len() >= self.max_history {
                history.pop_front();
            }
            history.push_back(update.clone());
        }
        let _ = self.tx.send(update);
    }
}
