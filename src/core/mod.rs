//! Core scheduling abstractions: collaborator interfaces, candidate
//! ordering, per-project chains, and the scheduler itself.

pub mod audit;
pub mod chain;
pub mod error;
pub mod ordering;
pub mod runner;
pub mod scheduler;
pub mod status;
pub mod store;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use chain::Spawn;
pub use error::{AppResult, SchedulerError, StartError};
pub use ordering::{admission_order, select_candidates, Candidate, CandidateSelection, UnparsableTask};
pub use runner::{ExecutionOptions, ExecutionRunner, ExitEvent, ExitReason, StartRequest};
pub use scheduler::{ChainInfo, PassOutcome, PassReport, QueueScheduler, SchedulerState};
pub use status::{QueueStatus, StatusSink};
pub use store::{ProjectRecord, Task, TaskStatus, TaskStore};
