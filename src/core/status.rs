//! Status snapshots published after admission passes.

use serde::{Deserialize, Serialize};

/// Per-project queue snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    /// Queue enabled flag from the task store.
    pub enabled: bool,
    /// Concurrency ceiling in effect.
    pub max_concurrent: u32,
    /// Live running count from the execution runner.
    pub running_count: usize,
    /// `max_concurrent - running_count`, floored at zero.
    pub available_slots: usize,
    /// Backlog size seen by the pass, when the pass read it.
    pub backlog_count: usize,
    /// Admission requests still pending on the project's chain.
    pub chain_depth: usize,
}

/// Sink for status snapshots (typically a UI event bus).
pub trait StatusSink: Send + Sync {
    /// Publish a snapshot scoped to a project.
    fn emit(&self, event: &str, project_id: &str, status: &QueueStatus);
}
