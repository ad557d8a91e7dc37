//! Error types for scheduler operations.

use thiserror::Error;

use crate::util::serde::TaskId;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The task store has no record of the project.
    #[error("unknown project: {0}")]
    UnknownProject(String),
    /// Task store read failed.
    #[error("task store error: {0}")]
    Store(String),
    /// Configuration rejected during validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// No tokio runtime was available to spawn scheduler tasks on.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),
    /// An admission pass panicked; the project's chain kept going.
    #[error("admission pass panicked: {0}")]
    PassPanicked(String),
}

/// Why the execution runner refused to start a task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    /// The runner already has a live execution for this task.
    #[error("task {0} is already running")]
    AlreadyRunning(TaskId),
    /// Any other start failure.
    #[error("failed to start execution: {0}")]
    Failed(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
