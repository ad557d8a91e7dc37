//! Task store interface and the task/project records the scheduler reads.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::QueueConfig;
use crate::core::SchedulerError;
use crate::util::serde::{Priority, ProjectId, TaskId};
use crate::util::timestamp::CreatedAt;

/// Lifecycle status persisted on a task record.
///
/// The scheduler only reads `Backlog`; everything else is owned by the UI
/// and the execution completion handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Eligible for admission.
    Backlog,
    /// An agent execution was started for it.
    Running,
    /// Waiting for automated review.
    AiReview,
    /// Waiting for a person.
    HumanReview,
    /// Finished.
    Done,
    /// Execution failed.
    Failed,
}

/// A persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Spec handed to the execution runner.
    pub spec_id: String,
    /// Persisted status. Not used for concurrency accounting.
    pub status: TaskStatus,
    /// Admission priority.
    pub priority: Priority,
    /// Creation time in whatever form the writer stored it.
    pub created_at: CreatedAt,
}

impl Task {
    /// Backlog task whose spec id equals its task id.
    pub fn backlog(
        id: impl Into<TaskId>,
        project_id: impl Into<ProjectId>,
        priority: Priority,
        created_at: impl Into<CreatedAt>,
    ) -> Self {
        let id = id.into();
        Self {
            spec_id: id.clone(),
            id,
            project_id: project_id.into(),
            status: TaskStatus::Backlog,
            priority,
            created_at: created_at.into(),
        }
    }
}

/// A persisted project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    /// Unique project identifier.
    pub id: ProjectId,
    /// Working directory executions run in.
    pub path: PathBuf,
    /// Queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Branch executions start from, when configured.
    #[serde(default)]
    pub base_branch: Option<String>,
}

impl ProjectRecord {
    /// Project with the given queue settings and no base branch.
    pub fn new(id: impl Into<ProjectId>, path: impl Into<PathBuf>, queue: QueueConfig) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            queue,
            base_branch: None,
        }
    }
}

/// Read access to durable project and task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Look up a project record.
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, SchedulerError>;

    /// Queue settings for a project.
    async fn get_project_queue_config(&self, project_id: &str) -> Result<QueueConfig, SchedulerError> {
        self.get_project(project_id)
            .await?
            .map(|p| p.queue)
            .ok_or_else(|| SchedulerError::UnknownProject(project_id.to_owned()))
    }

    /// Tasks in `Backlog` status for a project, in store order.
    async fn list_backlog_tasks(&self, project_id: &str) -> Result<Vec<Task>, SchedulerError>;
}
