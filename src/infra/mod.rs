//! In-memory adapters for the task store, execution runner, and status bus.

pub mod runner;
pub mod status;
pub mod store;

pub use runner::InMemoryExecutionRunner;
pub use status::{InMemoryStatusBus, StatusUpdate};
pub use store::InMemoryTaskStore;
