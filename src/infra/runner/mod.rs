//! Execution runner backends.

pub mod memory;

pub use memory::InMemoryExecutionRunner;
