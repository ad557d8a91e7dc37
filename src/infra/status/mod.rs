//! Status sink backends.

pub mod memory;

pub use memory::{InMemoryStatusBus, StatusUpdate};
