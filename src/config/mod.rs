//! Configuration models for the scheduler and per-project queues.

pub mod queue;

pub use queue::{QueueConfig, SchedulerConfig, DEFAULT_STATUS_EVENT};
