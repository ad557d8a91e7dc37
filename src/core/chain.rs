//! Per-project admission chains.
//!
//! Each project gets one worker task fed by an unbounded channel. Admission
//! requests are processed strictly in arrival order, one at a time, so two
//! passes for the same project never interleave. Different projects have
//! independent workers and run in parallel.
//!
//! A worker only holds a weak reference to the pass runner. Dropping the
//! scheduler drops the registry, which closes every channel and lets the
//! workers exit.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::core::error::SchedulerError;
use crate::core::scheduler::{PassOutcome, PassReport};
use crate::util::clock::now_ms;
use crate::util::serde::ProjectId;

/// Abstraction for spawning background work on a runtime.
pub trait Spawn {
    /// Spawn a future that runs to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Runs one admission pass. Implementations fold their own errors into the
/// returned report.
#[async_trait]
pub(crate) trait PassRunner: Send + Sync + 'static {
    async fn run_pass(&self, project_id: &str) -> PassReport;
}

pub(crate) enum ChainRequest {
    /// Run a pass; reply with its report if anyone is waiting.
    Pass {
        reply: Option<oneshot::Sender<PassReport>>,
    },
    /// Acknowledge once everything queued ahead of this has finished.
    Drain { done: oneshot::Sender<()> },
}

/// Diagnostics for one chain.
#[derive(Debug, Default)]
pub(crate) struct ChainStats {
    /// Passes enqueued but not finished, including the one running.
    depth: AtomicUsize,
    last_updated_ms: AtomicU64,
    completed: AtomicU64,
}

impl ChainStats {
    fn touch(&self) {
        let now = u64::try_from(now_ms()).unwrap_or(u64::MAX);
        self.last_updated_ms.store(now, Ordering::Release);
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    pub(crate) fn last_updated_ms(&self) -> u64 {
        self.last_updated_ms.load(Ordering::Acquire)
    }

    pub(crate) fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    fn finish_pass(&self) {
        self.depth.fetch_sub(1, Ordering::AcqRel);
        self.completed.fetch_add(1, Ordering::AcqRel);
        self.touch();
    }
}

/// Sending half of a project's chain.
#[derive(Clone)]
pub(crate) struct ChainHandle {
    tx: mpsc::UnboundedSender<ChainRequest>,
    stats: Arc<ChainStats>,
}

impl ChainHandle {
    /// Append a pass to the chain. Returns the depth after enqueueing, or
    /// `None` if the worker has already exited.
    pub(crate) fn enqueue_pass(&self, reply: Option<oneshot::Sender<PassReport>>) -> Option<usize> {
        let depth = self.stats.depth.fetch_add(1, Ordering::AcqRel) + 1;
        if self.tx.send(ChainRequest::Pass { reply }).is_err() {
            self.stats.depth.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        self.stats.touch();
        Some(depth)
    }

    /// Append a drain marker. The receiver resolves once every request
    /// queued before it has been processed.
    pub(crate) fn enqueue_drain(&self) -> Option<oneshot::Receiver<()>> {
        let (done, rx) = oneshot::channel();
        self.tx.send(ChainRequest::Drain { done }).ok()?;
        Some(rx)
    }

    pub(crate) fn stats(&self) -> &ChainStats {
        &self.stats
    }
}

/// Concurrency-safe map from project to its chain, created lazily.
#[derive(Default)]
pub(crate) struct ChainRegistry {
    chains: Mutex<HashMap<ProjectId, ChainHandle>>,
}

impl ChainRegistry {
    /// Append a pass to a project's chain, creating the chain and spawning
    /// its worker on first use. Returns the depth after enqueueing.
    ///
    /// `accepting` is checked and the request sent under the registry lock,
    /// so once `take_all` has run no pass can land behind a drain marker.
    /// Returns `None` when `accepting` is false or the worker has exited.
    pub(crate) fn enqueue_pass<R, S>(
        &self,
        project_id: &str,
        accepting: impl FnOnce() -> bool,
        reply: Option<oneshot::Sender<PassReport>>,
        runner: Weak<R>,
        spawner: &S,
    ) -> Option<usize>
    where
        R: PassRunner,
        S: Spawn,
    {
        let mut chains = self.chains.lock();
        if !accepting() {
            return None;
        }
        let handle = chains.entry(project_id.to_owned()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let stats = Arc::new(ChainStats::default());
            stats.touch();
            spawner.spawn(run_chain(project_id.to_owned(), rx, Arc::clone(&stats), runner));
            debug!(project_id, "created admission chain");
            ChainHandle { tx, stats }
        });
        handle.enqueue_pass(reply)
    }

    /// Pending depth for a project; zero when it has no chain.
    pub(crate) fn depth(&self, project_id: &str) -> usize {
        self.chains
            .lock()
            .get(project_id)
            .map_or(0, |h| h.stats().depth())
    }

    pub(crate) fn get(&self, project_id: &str) -> Option<ChainHandle> {
        self.chains.lock().get(project_id).cloned()
    }

    pub(crate) fn project_ids(&self) -> Vec<ProjectId> {
        self.chains.lock().keys().cloned().collect()
    }

    /// Remove every chain, returning their handles for draining.
    pub(crate) fn take_all(&self) -> Vec<(ProjectId, ChainHandle)> {
        self.chains.lock().drain().collect()
    }
}

async fn run_chain<R: PassRunner>(
    project_id: ProjectId,
    mut rx: mpsc::UnboundedReceiver<ChainRequest>,
    stats: Arc<ChainStats>,
    runner: Weak<R>,
) {
    while let Some(request) = rx.recv().await {
        match request {
            ChainRequest::Pass { reply } => {
                let report = match runner.upgrade() {
                    Some(runner) => run_guarded(runner.as_ref(), &project_id).await,
                    None => PassReport::new(&project_id, PassOutcome::ShuttingDown),
                };
                stats.finish_pass();
                if let Some(reply) = reply {
                    let _ = reply.send(report);
                }
            }
            ChainRequest::Drain { done } => {
                let _ = done.send(());
            }
        }
    }
    debug!(project_id = %project_id, "admission chain closed");
}

/// Run a pass so that a panic inside it still lets the chain advance.
async fn run_guarded<R: PassRunner>(runner: &R, project_id: &str) -> PassReport {
    match AssertUnwindSafe(runner.run_pass(project_id)).catch_unwind().await {
        Ok(report) => report,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            error!(project_id, panic = %message, "admission pass panicked");
            let err = SchedulerError::PassPanicked(message);
            PassReport::new(project_id, PassOutcome::Failed(err.to_string()))
        }
    }
}
