//! In-memory task store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::QueueConfig;
use crate::core::{ProjectRecord, SchedulerError, Task, TaskStatus, TaskStore};
use crate::util::serde::ProjectId;

/// Task store kept in process memory, for development and tests.
///
/// Tasks are listed in insertion order.
#[derive(Default)]
pub struct InMemoryTaskStore {
    projects: RwLock<HashMap<ProjectId, ProjectRecord>>,
    tasks: RwLock<Vec<Task>>,
    unavailable: AtomicBool,
}

impl InMemoryTaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a project record.
    pub fn insert_project(&self, project: ProjectRecord) {
        self.projects.write().insert(project.id.clone(), project);
    }

    /// Replace a project's queue settings. Returns `false` for unknown projects.
    pub fn set_queue_config(&self, project_id: &str, queue: QueueConfig) -> bool {
        match self.projects.write().get_mut(project_id) {
            Some(project) => {
                project.queue = queue;
                true
            }
            None => false,
        }
    }

    /// Append a task record.
    pub fn add_task(&self, task: Task) {
        self.tasks.write().push(task);
    }

    /// Update a task's persisted status. Returns `false` for unknown tasks.
    pub fn set_status(&self, task_id: &str, status: TaskStatus) -> bool {
        match self.tasks.write().iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => false,
        }
    }

    /// Look up a task record.
    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().iter().find(|t| t.id == task_id).cloned()
    }

    /// All tasks of a project regardless of status.
    pub fn tasks(&self, project_id: &str) -> Vec<Task> {
        self.tasks
            .read()
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Make every read fail with [`SchedulerError::Store`], to exercise
    /// error paths.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    fn check_available(&self) -> Result<(), SchedulerError> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(SchedulerError::Store("store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, SchedulerError> {
        self.check_available()?;
        Ok(self.projects.read().get(project_id).cloned())
    }

    async fn list_backlog_tasks(&self, project_id: &str) -> Result<Vec<Task>, SchedulerError> {
        self.check_available()?;
        Ok(self
            .tasks
            .read()
            .iter()
            .filter(|t| t.project_id == project_id && t.status == TaskStatus::Backlog)
            .cloned()
            .collect())
    }
}
