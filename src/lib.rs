//! # Prometheus Agent Queue
//!
//! Per-project admission scheduler for AI coding-agent executions.
//!
//! Each project has a backlog of tasks and a concurrency ceiling. The
//! scheduler decides which backlog tasks become running executions: it reads
//! the backlog from a task store, checks live capacity with the execution
//! runner, starts the best candidates, and publishes a status snapshot. When
//! an execution exits, the next pass runs automatically.
//!
//! ## Core Guarantees
//!
//! - **Live capacity accounting**: the runner's running set is the only
//!   source of truth; persisted task status is never trusted for it
//! - **Priority admission**: urgent > high > medium > low, oldest first
//!   within a priority
//! - **Per-project serialization**: passes for one project run one at a time
//!   in arrival order, so concurrent triggers can't over-admit
//! - **Tolerant input**: tasks with unreadable creation times are skipped for
//!   the pass and retried on the next one
//! - **Graceful drain**: `stop()` returns only after every in-flight pass
//!   has finished
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_agent_queue::builders::QueueSchedulerBuilder;
//! use prometheus_agent_queue::infra::{InMemoryExecutionRunner, InMemoryStatusBus, InMemoryTaskStore};
//!
//! let store = Arc::new(InMemoryTaskStore::new());
//! let runner = Arc::new(InMemoryExecutionRunner::new());
//! let bus = Arc::new(InMemoryStatusBus::default());
//!
//! let scheduler = QueueSchedulerBuilder::on_current_runtime(store, runner, bus)?.build()?;
//!
//! // Task created, settings changed, ...
//! let report = scheduler.trigger_queue("project-1").await;
//! println!("admitted {:?}", report.admitted);
//!
//! scheduler.stop().await;
//! ```
//!
//! For complete scenarios, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions, ordering, chains, and the scheduler.
pub mod core;
/// Configuration models for the scheduler and project queues.
pub mod config;
/// Builders to construct the scheduler from collaborators.
pub mod builders;
/// In-memory adapters for the store, runner, and status bus.
pub mod infra;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
