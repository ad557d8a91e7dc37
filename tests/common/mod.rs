//! Shared harness for scheduler integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use prometheus_agent_queue::builders::QueueSchedulerBuilder;
use prometheus_agent_queue::config::{QueueConfig, SchedulerConfig};
use prometheus_agent_queue::core::{
    InMemoryAuditSink, ProjectRecord, QueueScheduler, Task, TaskStatus,
};
use prometheus_agent_queue::infra::{InMemoryExecutionRunner, InMemoryStatusBus, InMemoryTaskStore};
use prometheus_agent_queue::runtime::TokioSpawner;
use prometheus_agent_queue::util::timestamp::CreatedAt;
use prometheus_agent_queue::util::Priority;

pub struct Harness {
    pub store: Arc<InMemoryTaskStore>,
    pub runner: Arc<InMemoryExecutionRunner>,
    pub bus: Arc<InMemoryStatusBus>,
    pub audit: Arc<Mutex<InMemoryAuditSink>>,
    pub scheduler: QueueScheduler<TokioSpawner>,
}

impl Harness {
    /// Must be called from inside a tokio runtime.
    pub fn new() -> Self {
        Self::with(InMemoryExecutionRunner::new(), SchedulerConfig::default())
    }

    pub fn with_runner(runner: InMemoryExecutionRunner) -> Self {
        Self::with(runner, SchedulerConfig::default())
    }

    pub fn with(runner: InMemoryExecutionRunner, config: SchedulerConfig) -> Self {
        prometheus_agent_queue::util::init_tracing();
        let store = Arc::new(InMemoryTaskStore::new());
        let runner = Arc::new(runner);
        let bus = Arc::new(InMemoryStatusBus::default());
        let audit = Arc::new(Mutex::new(InMemoryAuditSink::new(256)));

        let scheduler = QueueSchedulerBuilder::on_current_runtime(
            store.clone(),
            runner.clone(),
            bus.clone(),
        )
        .expect("tokio runtime")
        .with_config(config)
        .with_audit(Box::new(audit.clone()))
        .build()
        .expect("valid config");

        Self {
            store,
            runner,
            bus,
            audit,
            scheduler,
        }
    }

    /// Add a project with an enabled queue.
    pub fn project(&self, project_id: &str, max_concurrent: u32) {
        self.store.insert_project(ProjectRecord::new(
            project_id,
            format!("/work/{project_id}"),
            QueueConfig::enabled_with(max_concurrent),
        ));
    }

    /// Add a backlog task.
    pub fn task(&self, task_id: &str, project_id: &str, priority: Priority, created_at: impl Into<CreatedAt>) {
        self.store
            .add_task(Task::backlog(task_id, project_id, priority, created_at));
    }

    /// Mark a task done in the store, then end its execution.
    pub fn finish(&self, task_id: &str) -> bool {
        self.store.set_status(task_id, TaskStatus::Done);
        self.runner.complete(task_id, 0)
    }

    pub fn completed_passes(&self, project_id: &str) -> u64 {
        self.scheduler
            .chain_info(project_id)
            .map_or(0, |info| info.completed_passes)
    }
}

/// Poll `cond` every few milliseconds until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, cond: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
