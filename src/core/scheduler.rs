//! Queue scheduler: turns backlog tasks into running executions.
//!
//! A pass for a project reads the queue settings and backlog from the task
//! store, checks live capacity with the execution runner, starts as many of
//! the best candidates as fit, and publishes a status snapshot. Passes are
//! serialized per project through [`chain`](crate::core::chain); exits
//! reported by the runner request a new pass automatically.
//!
//! Lifecycle is `Running -> ShuttingDown -> Stopped`. Once shutdown starts no
//! pass admits anything, and [`QueueScheduler::stop`] returns only after
//! every chain has drained.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot, watch};
use tracing::{debug, info, warn};

use crate::config::{QueueConfig, SchedulerConfig};
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::chain::{ChainRegistry, PassRunner, Spawn};
use crate::core::ordering::select_candidates;
use crate::core::runner::{ExecutionOptions, ExecutionRunner, ExitEvent, StartRequest};
use crate::core::status::{QueueStatus, StatusSink};
use crate::core::store::{ProjectRecord, TaskStore};
use crate::core::{SchedulerError, StartError};
use crate::util::serde::{ProjectId, TaskId};

/// Scheduler-wide lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Accepting and running admission passes.
    Running,
    /// `stop()` was called; outstanding chains are draining.
    ShuttingDown,
    /// Drain finished. Terminal.
    Stopped,
}

/// How a pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass evaluated the backlog.
    Completed,
    /// The scheduler was not running when the pass began.
    ShuttingDown,
    /// The project's queue is disabled.
    QueueDisabled,
    /// The project was already at its concurrency ceiling.
    NoCapacity,
    /// The pass could not complete (store failure, unknown project, panic).
    Failed(String),
}

/// What a single pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Project the pass ran for.
    pub project_id: ProjectId,
    /// How the pass ended.
    pub outcome: PassOutcome,
    /// Tasks started, in start order.
    pub admitted: Vec<TaskId>,
    /// Candidates the runner already had running.
    pub skipped_running: Vec<TaskId>,
    /// Backlog tasks excluded for an unreadable creation time.
    pub skipped_unparsable: Vec<TaskId>,
    /// Candidates the runner refused, with its reason.
    pub failed: Vec<(TaskId, String)>,
    /// Snapshot published at the end of the pass, if one was.
    pub status: Option<QueueStatus>,
}

impl PassReport {
    /// Empty report with the given outcome.
    pub fn new(project_id: &str, outcome: PassOutcome) -> Self {
        Self {
            project_id: project_id.to_owned(),
            outcome,
            admitted: Vec::new(),
            skipped_running: Vec::new(),
            skipped_unparsable: Vec::new(),
            failed: Vec::new(),
            status: None,
        }
    }
}

/// Diagnostics for a project's admission chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    /// Passes enqueued but not finished.
    pub depth: usize,
    /// Last enqueue or completion, ms since epoch.
    pub last_updated_ms: u64,
    /// Passes finished since the chain was created.
    pub completed_passes: u64,
}

type SharedAudit = Arc<Mutex<Box<dyn AuditSink>>>;

pub(crate) struct SchedulerInner<S> {
    store: Arc<dyn TaskStore>,
    runner: Arc<dyn ExecutionRunner>,
    status: Arc<dyn StatusSink>,
    audit: Option<SharedAudit>,
    config: SchedulerConfig,
    spawner: S,
    chains: ChainRegistry,
    state: watch::Sender<SchedulerState>,
}

/// Per-project admission scheduler. Cheap to clone; clones share state.
pub struct QueueScheduler<S> {
    inner: Arc<SchedulerInner<S>>,
}

impl<S> Clone for QueueScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> QueueScheduler<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Wire the scheduler to its collaborators and, when configured, start
    /// listening for exit notifications. Usually called through
    /// [`QueueSchedulerBuilder`](crate::builders::QueueSchedulerBuilder).
    pub fn new(
        store: Arc<dyn TaskStore>,
        runner: Arc<dyn ExecutionRunner>,
        status: Arc<dyn StatusSink>,
        audit: Option<Box<dyn AuditSink>>,
        config: SchedulerConfig,
        spawner: S,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let (state, _) = watch::channel(SchedulerState::Running);
        let retrigger = config.retrigger_on_exit;
        let inner = Arc::new(SchedulerInner {
            store,
            runner,
            status,
            audit: audit.map(|a| Arc::new(Mutex::new(a))),
            config,
            spawner,
            chains: ChainRegistry::default(),
            state,
        });

        if retrigger {
            let exits = inner.runner.subscribe_exits();
            let state_rx = inner.state.subscribe();
            inner
                .spawner
                .spawn(listen_for_exits(Arc::downgrade(&inner), exits, state_rx));
        }
        info!(retrigger_on_exit = retrigger, "queue scheduler started");

        Ok(Self { inner })
    }

    /// Request an admission pass for a project and wait for it to finish.
    ///
    /// The pass is appended to the project's chain, so concurrent calls run
    /// one after another in arrival order. Individual start failures are
    /// logged and reported, never returned as errors.
    pub async fn trigger_queue(&self, project_id: &str) -> PassReport {
        let (tx, rx) = oneshot::channel();
        if !self.inner.enqueue_pass(project_id, Some(tx)) {
            return PassReport::new(project_id, PassOutcome::ShuttingDown);
        }
        rx.await
            .unwrap_or_else(|_| PassReport::new(project_id, PassOutcome::ShuttingDown))
    }

    /// Request an admission pass without waiting for it. Returns `false` if
    /// the scheduler is no longer accepting work.
    pub fn request_pass(&self, project_id: &str) -> bool {
        self.inner.enqueue_pass(project_id, None)
    }

    /// Whether another task could start right now: the queue is enabled,
    /// the scheduler is running, and the live running count is below the
    /// ceiling. Persisted task status is never consulted.
    pub async fn can_start_more_tasks(&self, project_id: &str) -> bool {
        if self.state() != SchedulerState::Running {
            return false;
        }
        let queue = match self.inner.store.get_project_queue_config(project_id).await {
            Ok(queue) => queue,
            Err(err) => {
                warn!(project_id, error = %err, "could not read queue config");
                return false;
            }
        };
        queue.enabled && self.inner.runner.running_count(project_id) < queue.effective_max_concurrent()
    }

    /// Current snapshot for a project without running a pass or emitting.
    pub async fn queue_status(&self, project_id: &str) -> Result<QueueStatus, SchedulerError> {
        let project = self.inner.project(project_id).await?;
        let backlog = self.inner.store.list_backlog_tasks(project_id).await?;
        Ok(self.inner.snapshot(project_id, &project.queue, backlog.len()))
    }

    /// Pending depth of a project's chain.
    pub fn chain_depth(&self, project_id: &str) -> usize {
        self.inner.chains.depth(project_id)
    }

    /// Chain diagnostics, if the project has a chain.
    pub fn chain_info(&self, project_id: &str) -> Option<ChainInfo> {
        self.inner.chains.get(project_id).map(|handle| {
            let stats = handle.stats();
            ChainInfo {
                depth: stats.depth(),
                last_updated_ms: stats.last_updated_ms(),
                completed_passes: stats.completed(),
            }
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.inner.state()
    }

    /// Stop admitting and wait for every in-flight pass to finish.
    ///
    /// The drain runs on the scheduler's spawner, so it completes even if
    /// this future is dropped. No timeout is applied. Calling `stop` again,
    /// or concurrently, waits for the same drain.
    pub async fn stop(&self) {
        let mut state = self.inner.state.subscribe();
        let began = self.inner.state.send_if_modified(|current| {
            if *current == SchedulerState::Running {
                *current = SchedulerState::ShuttingDown;
                true
            } else {
                false
            }
        });

        if began {
            info!("queue scheduler shutting down");
            self.inner.record("", None, AuditAction::ShutdownRequested, None);
            self.inner.spawner.spawn(Arc::clone(&self.inner).drain());
        }

        let _ = state.wait_for(|s| *s == SchedulerState::Stopped).await;
    }
}

impl<S> SchedulerInner<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Append a pass to the project's chain, creating the chain on first
    /// use. Returns `false` once shutdown has begun.
    fn enqueue_pass(self: &Arc<Self>, project_id: &str, reply: Option<oneshot::Sender<PassReport>>) -> bool {
        let accepting = || *self.state.borrow() == SchedulerState::Running;
        let Some(depth) =
            self.chains
                .enqueue_pass(project_id, accepting, reply, Arc::downgrade(self), &self.spawner)
        else {
            debug!(project_id, "scheduler not running; trigger ignored");
            return false;
        };
        if depth > self.config.chain_depth_warn {
            warn!(project_id, depth, "admission chain is growing");
        }
        true
    }

    /// Wait for every chain to finish what it has queued, then mark the
    /// scheduler stopped.
    async fn drain(self: Arc<Self>) {
        let chains = self.chains.take_all();
        let project_count = chains.len();
        let drains: Vec<_> = chains
            .iter()
            .filter_map(|(_, handle)| handle.enqueue_drain())
            .collect();
        drop(chains);
        join_all(drains).await;

        self.record("", None, AuditAction::Stopped, None);
        self.state.send_replace(SchedulerState::Stopped);
        info!(projects = project_count, "queue scheduler stopped");
    }

    fn on_exit(self: &Arc<Self>, event: &ExitEvent) {
        debug!(
            project_id = %event.project_id,
            task_id = %event.task_id,
            exit_code = ?event.exit_code,
            reason = ?event.reason,
            "execution exited"
        );
        self.record(
            &event.project_id,
            Some(&event.task_id),
            AuditAction::Exited,
            Some(format!("{:?}", event.reason)),
        );
        self.enqueue_pass(&event.project_id, None);
    }

    async fn project(&self, project_id: &str) -> Result<ProjectRecord, SchedulerError> {
        self.store
            .get_project(project_id)
            .await?
            .ok_or_else(|| SchedulerError::UnknownProject(project_id.to_owned()))
    }

    fn snapshot(&self, project_id: &str, queue: &QueueConfig, backlog_count: usize) -> QueueStatus {
        let max = queue.effective_max_concurrent();
        let running_count = self.runner.running_count(project_id);
        QueueStatus {
            enabled: queue.enabled,
            max_concurrent: queue.max_concurrent.max(1),
            running_count,
            available_slots: max.saturating_sub(running_count),
            backlog_count,
            chain_depth: self.chains.depth(project_id),
        }
    }

    fn publish(&self, project_id: &str, queue: &QueueConfig, backlog_count: usize) -> QueueStatus {
        let status = self.snapshot(project_id, queue, backlog_count);
        self.status.emit(&self.config.status_event, project_id, &status);
        status
    }

    fn record(&self, project_id: &str, task_id: Option<&str>, action: AuditAction, detail: Option<String>) {
        if let Some(audit) = &self.audit {
            audit
                .lock()
                .record(build_audit_event(project_id, task_id, action, detail));
        }
    }

    async fn admit(&self, project_id: &str) -> Result<PassReport, SchedulerError> {
        let mut report = PassReport::new(project_id, PassOutcome::Completed);

        if self.state() != SchedulerState::Running {
            debug!(project_id, "scheduler shutting down; pass skipped");
            report.outcome = PassOutcome::ShuttingDown;
            return Ok(report);
        }

        let project = self.project(project_id).await?;
        let queue = project.queue;
        if !queue.enabled {
            debug!(project_id, "queue disabled; pass skipped");
            report.outcome = PassOutcome::QueueDisabled;
            return Ok(report);
        }
        if let Err(reason) = queue.validate() {
            warn!(project_id, %reason, "stored queue config invalid; using max_concurrent = 1");
        }

        let max = queue.effective_max_concurrent();
        let running = self.runner.running_count(project_id);
        let available_slots = max.saturating_sub(running);
        if available_slots == 0 {
            debug!(project_id, running, max, "no free slots");
            report.outcome = PassOutcome::NoCapacity;
            report.status = Some(self.publish(project_id, &queue, 0));
            return Ok(report);
        }

        let backlog = self.store.list_backlog_tasks(project_id).await?;
        let backlog_count = backlog.len();
        let selection = select_candidates(backlog);

        for skipped in selection.unparsable {
            warn!(
                project_id,
                task_id = %skipped.task_id,
                raw = %skipped.raw,
                "unparsable creation time; task skipped for this pass"
            );
            self.record(
                project_id,
                Some(&skipped.task_id),
                AuditAction::SkippedUnparsable,
                Some(skipped.raw),
            );
            report.skipped_unparsable.push(skipped.task_id);
        }

        let options = ExecutionOptions {
            base_branch: project.base_branch.clone(),
            ..ExecutionOptions::default()
        };

        // Only the first `available_slots` candidates are considered. A skip
        // or failure inside that window does not pull in a lower-ranked task.
        let mut ordered = selection.ordered;
        ordered.truncate(available_slots);

        for candidate in ordered {
            if self.runner.running_count(project_id) >= max {
                debug!(project_id, max, "project filled up during pass");
                break;
            }

            let task = candidate.task;
            if self.runner.is_running(&task.id) {
                debug!(project_id, task_id = %task.id, "candidate already running");
                self.record(project_id, Some(&task.id), AuditAction::SkippedRunning, None);
                report.skipped_running.push(task.id);
                continue;
            }

            let request = StartRequest {
                task_id: task.id.clone(),
                project_id: project_id.to_owned(),
                project_path: project.path.clone(),
                spec_id: task.spec_id.clone(),
                options: options.clone(),
            };
            match self.runner.start_task_execution(request).await {
                Ok(()) => {
                    info!(
                        project_id,
                        task_id = %task.id,
                        priority = ?task.priority,
                        "task admitted"
                    );
                    self.record(project_id, Some(&task.id), AuditAction::Admitted, None);
                    report.admitted.push(task.id);
                }
                Err(StartError::AlreadyRunning(_)) => {
                    warn!(project_id, task_id = %task.id, "task started elsewhere during pass; skipped");
                    self.record(project_id, Some(&task.id), AuditAction::SkippedRunning, None);
                    report.skipped_running.push(task.id);
                }
                Err(err) => {
                    warn!(project_id, task_id = %task.id, error = %err, "failed to start task");
                    self.record(
                        project_id,
                        Some(&task.id),
                        AuditAction::StartFailed,
                        Some(err.to_string()),
                    );
                    report.failed.push((task.id, err.to_string()));
                }
            }
        }

        report.status = Some(self.publish(project_id, &queue, backlog_count));
        debug!(
            project_id,
            admitted = report.admitted.len(),
            skipped_running = report.skipped_running.len(),
            skipped_unparsable = report.skipped_unparsable.len(),
            failed = report.failed.len(),
            "admission pass complete"
        );
        Ok(report)
    }
}

#[async_trait]
impl<S> PassRunner for SchedulerInner<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    async fn run_pass(&self, project_id: &str) -> PassReport {
        match self.admit(project_id).await {
            Ok(report) => report,
            Err(err) => {
                warn!(project_id, error = %err, "admission pass failed");
                PassReport::new(project_id, PassOutcome::Failed(err.to_string()))
            }
        }
    }
}

async fn listen_for_exits<S>(
    inner: Weak<SchedulerInner<S>>,
    mut exits: broadcast::Receiver<ExitEvent>,
    mut state: watch::Receiver<SchedulerState>,
) where
    S: Spawn + Clone + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() || *state.borrow() != SchedulerState::Running {
                    break;
                }
            }
            event = exits.recv() => {
                let Some(inner) = inner.upgrade() else { break };
                match event {
                    Ok(event) => inner.on_exit(&event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "exit listener lagged; requesting passes for all known projects");
                        for project_id in inner.chains.project_ids() {
                            inner.enqueue_pass(&project_id, None);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("exit listener stopped");
}
