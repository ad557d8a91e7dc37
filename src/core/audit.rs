//! Audit trail of admission decisions.
//!
//! Every start, skip, and failure a pass makes is recorded here, along with
//! exit notifications and shutdown transitions.

use std::collections::VecDeque;
use std::fmt;

use crate::util::clock::now_ms;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// A backlog task was started.
    Admitted,
    /// Candidate skipped because the runner already had it running.
    SkippedRunning,
    /// Candidate skipped because its creation time could not be read.
    SkippedUnparsable,
    /// The runner refused to start a candidate.
    StartFailed,
    /// An execution exited and a new pass was requested.
    Exited,
    /// `stop()` was called.
    ShutdownRequested,
    /// Drain finished.
    Stopped,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admitted => "admitted",
            Self::SkippedRunning => "skipped_running",
            Self::SkippedUnparsable => "skipped_unparsable",
            Self::StartFailed => "start_failed",
            Self::Exited => "exited",
            Self::ShutdownRequested => "shutdown_requested",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Project the event concerns; empty for scheduler-wide events.
    pub project_id: String,
    /// Related task, if any.
    pub task_id: Option<String>,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }

    /// Stored events with the given action, oldest first.
    pub fn events_with(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event with a fresh id and the current time.
pub fn build_audit_event(
    project_id: impl Into<String>,
    task_id: Option<&str>,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        project_id: project_id.into(),
        task_id: task_id.map(str::to_owned),
        action,
        created_at_ms: now_ms(),
        detail,
    }
}

/// Shared sink: lets callers keep a handle to the sink they hand over.
impl<T: AuditSink> AuditSink for std::sync::Arc<parking_lot::Mutex<T>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}
