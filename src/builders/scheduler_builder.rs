//! Builder wiring the queue scheduler to its collaborators.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{AuditSink, ExecutionRunner, QueueScheduler, SchedulerError, Spawn, StatusSink, TaskStore};
use crate::runtime::TokioSpawner;

/// Collects collaborators and settings, then starts a [`QueueScheduler`].
pub struct QueueSchedulerBuilder<S> {
    store: Arc<dyn TaskStore>,
    runner: Arc<dyn ExecutionRunner>,
    status: Arc<dyn StatusSink>,
    audit: Option<Box<dyn AuditSink>>,
    config: SchedulerConfig,
    spawner: S,
}

impl QueueSchedulerBuilder<TokioSpawner> {
    /// Builder that spawns onto the tokio runtime the caller is running on.
    pub fn on_current_runtime(
        store: Arc<dyn TaskStore>,
        runner: Arc<dyn ExecutionRunner>,
        status: Arc<dyn StatusSink>,
    ) -> Result<Self, SchedulerError> {
        Ok(Self::new(store, runner, status, TokioSpawner::current()?))
    }
}

impl<S> QueueSchedulerBuilder<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Builder with default configuration and no audit sink.
    pub fn new(
        store: Arc<dyn TaskStore>,
        runner: Arc<dyn ExecutionRunner>,
        status: Arc<dyn StatusSink>,
        spawner: S,
    ) -> Self {
        Self {
            store,
            runner,
            status,
            audit: None,
            config: SchedulerConfig::default(),
            spawner,
        }
    }

    /// Replace the scheduler configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Validate configuration and start the scheduler.
    pub fn build(self) -> Result<QueueScheduler<S>, SchedulerError> {
        QueueScheduler::new(
            self.store,
            self.runner,
            self.status,
            self.audit,
            self.config,
            self.spawner,
        )
    }
}
