//! In-memory execution runner.
//!
//! Tracks a running set without spawning anything. Tests drive lifecycles
//! by hand: [`InMemoryExecutionRunner::complete`] ends an execution and
//! publishes the exit, `kill_task` does the same with `ExitReason::Killed`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::core::{ExecutionRunner, ExitEvent, ExitReason, StartError, StartRequest};
use crate::util::serde::{ProjectId, TaskId};

const EXIT_CHANNEL_CAPACITY: usize = 256;

/// Execution runner that keeps its running set in memory.
pub struct InMemoryExecutionRunner {
    running: Mutex<HashMap<TaskId, ProjectId>>,
    started: Mutex<Vec<StartRequest>>,
    failures: Mutex<HashMap<TaskId, String>>,
    start_delay: Mutex<Option<Duration>>,
    peak_running: Mutex<HashMap<ProjectId, usize>>,
    exits: broadcast::Sender<ExitEvent>,
}

impl Default for InMemoryExecutionRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryExecutionRunner {
    /// Create a runner with nothing running.
    pub fn new() -> Self {
        let (exits, _) = broadcast::channel(EXIT_CHANNEL_CAPACITY);
        Self {
            running: Mutex::new(HashMap::new()),
            started: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            start_delay: Mutex::new(None),
            peak_running: Mutex::new(HashMap::new()),
            exits,
        }
    }

    /// Delay every start by `delay` before the task enters the running set.
    #[must_use]
    pub fn with_start_delay(self, delay: Duration) -> Self {
        *self.start_delay.lock() = Some(delay);
        self
    }

    /// Change the start delay.
    pub fn set_start_delay(&self, delay: Option<Duration>) {
        *self.start_delay.lock() = delay;
    }

    /// Make starts of `task_id` fail with [`StartError::Failed`].
    pub fn fail_start(&self, task_id: &str, reason: &str) {
        self.failures.lock().insert(task_id.to_owned(), reason.to_owned());
    }

    /// Put a task in the running set as if it had been started elsewhere.
    pub fn mark_running(&self, task_id: &str, project_id: &str) {
        self.insert_running(task_id, project_id);
    }

    /// End an execution and publish its exit. Returns `false` if the task
    /// was not running.
    pub fn complete(&self, task_id: &str, exit_code: i32) -> bool {
        let reason = if exit_code == 0 {
            ExitReason::Completed
        } else {
            ExitReason::Failed
        };
        self.finish(task_id, Some(exit_code), reason)
    }

    /// Start requests accepted so far, in order.
    pub fn started(&self) -> Vec<StartRequest> {
        self.started.lock().clone()
    }

    /// Task ids accepted so far, in start order.
    pub fn started_ids(&self) -> Vec<TaskId> {
        self.started.lock().iter().map(|r| r.task_id.clone()).collect()
    }

    /// Highest running count ever observed for a project.
    pub fn peak_running(&self, project_id: &str) -> usize {
        self.peak_running.lock().get(project_id).copied().unwrap_or(0)
    }

    fn insert_running(&self, task_id: &str, project_id: &str) -> bool {
        let mut running = self.running.lock();
        if running.contains_key(task_id) {
            return false;
        }
        running.insert(task_id.to_owned(), project_id.to_owned());
        let count = running.values().filter(|p| p.as_str() == project_id).count();
        drop(running);

        let mut peaks = self.peak_running.lock();
        let peak = peaks.entry(project_id.to_owned()).or_insert(0);
        *peak = (*peak).max(count);
        true
    }

    fn finish(&self, task_id: &str, exit_code: Option<i32>, reason: ExitReason) -> bool {
        let Some(project_id) = self.running.lock().remove(task_id) else {
            return false;
        };
        debug!(task_id, project_id = %project_id, ?reason, "execution exited");
        // No subscribers is fine.
        let _ = self.exits.send(ExitEvent {
            task_id: task_id.to_owned(),
            project_id,
            exit_code,
            reason,
        });
        true
    }
}

#[async_trait]
impl ExecutionRunner for InMemoryExecutionRunner {
    fn is_running(&self, task_id: &str) -> bool {
        self.running.lock().contains_key(task_id)
    }

    fn running_task_ids(&self, project_id: &str) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .running
            .lock()
            .iter()
            .filter(|(_, p)| p.as_str() == project_id)
            .map(|(t, _)| t.clone())
            .collect();
        ids.sort();
        ids
    }

    async fn start_task_execution(&self, request: StartRequest) -> Result<(), StartError> {
        let delay = *self.start_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().get(&request.task_id).cloned();
        if let Some(reason) = failure {
            return Err(StartError::Failed(reason));
        }
        if !self.insert_running(&request.task_id, &request.project_id) {
            return Err(StartError::AlreadyRunning(request.task_id));
        }

        debug!(task_id = %request.task_id, project_id = %request.project_id, "execution started");
        self.started.lock().push(request);
        Ok(())
    }

    async fn kill_task(&self, task_id: &str) -> bool {
        self.finish(task_id, None, ExitReason::Killed)
    }

    fn subscribe_exits(&self) -> broadcast::Receiver<ExitEvent> {
        self.exits.subscribe()
    }
}
