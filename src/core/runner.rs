//! Execution runner interface.
//!
//! The runner owns process lifecycles and the live running set. The
//! scheduler reads the running set, asks for starts, and listens for exits.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::core::StartError;
use crate::util::serde::{ProjectId, TaskId};

/// Options passed through to the runner on start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {
    /// Let the agent fan work out across parallel workers.
    pub parallel: bool,
    /// Worker count when `parallel` is set.
    pub workers: u32,
    /// Branch to start from.
    pub base_branch: Option<String>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            workers: 1,
            base_branch: None,
        }
    }
}

/// Everything the runner needs to start one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Task to execute.
    pub task_id: TaskId,
    /// Project the task belongs to.
    pub project_id: ProjectId,
    /// Project working directory.
    pub project_path: PathBuf,
    /// Spec the agent works from.
    pub spec_id: String,
    /// Start options.
    pub options: ExecutionOptions,
}

/// Why an execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Process exited on its own with status 0.
    Completed,
    /// Process exited on its own with a failure.
    Failed,
    /// Process was terminated by `kill_task`.
    Killed,
}

/// Exit notification published by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitEvent {
    /// Task whose execution ended.
    pub task_id: TaskId,
    /// Project the task belongs to.
    pub project_id: ProjectId,
    /// Process exit code, when there was one.
    pub exit_code: Option<i32>,
    /// Exit classification.
    pub reason: ExitReason,
}

/// Process-lifecycle owner consumed by the scheduler.
#[async_trait]
pub trait ExecutionRunner: Send + Sync {
    /// Whether the task has a live execution.
    fn is_running(&self, task_id: &str) -> bool;

    /// Live executions for a project.
    fn running_task_ids(&self, project_id: &str) -> Vec<TaskId>;

    /// Size of the live running set for a project.
    fn running_count(&self, project_id: &str) -> usize {
        self.running_task_ids(project_id).len()
    }

    /// Start an execution. Fails with [`StartError::AlreadyRunning`] when the
    /// task already has one.
    async fn start_task_execution(&self, request: StartRequest) -> Result<(), StartError>;

    /// Force-terminate an execution. Returns `false` if nothing was running.
    async fn kill_task(&self, task_id: &str) -> bool;

    /// Subscribe to exit notifications.
    fn subscribe_exits(&self) -> broadcast::Receiver<ExitEvent>;
}
