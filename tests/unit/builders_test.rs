//! Tests for builder modules

use std::sync::Arc;

use prometheus_agent_queue::builders::QueueSchedulerBuilder;
use prometheus_agent_queue::config::SchedulerConfig;
use prometheus_agent_queue::core::{SchedulerError, SchedulerState};
use prometheus_agent_queue::infra::{InMemoryExecutionRunner, InMemoryStatusBus, InMemoryTaskStore};
use prometheus_agent_queue::runtime::TokioSpawner;

fn parts() -> (Arc<InMemoryTaskStore>, Arc<InMemoryExecutionRunner>, Arc<InMemoryStatusBus>) {
    (
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(InMemoryExecutionRunner::new()),
        Arc::new(InMemoryStatusBus::default()),
    )
}

#[tokio::test]
async fn test_builder_defaults() {
    let (store, runner, bus) = parts();
    let scheduler = QueueSchedulerBuilder::on_current_runtime(store, runner, bus)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Running);
    assert_eq!(scheduler.chain_depth("p1"), 0);
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let (store, runner, bus) = parts();
    let config = SchedulerConfig {
        status_event: String::new(),
        ..SchedulerConfig::default()
    };
    let result = QueueSchedulerBuilder::new(store, runner, bus, TokioSpawner::current().unwrap())
        .with_config(config)
        .build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_builder_needs_runtime() {
    let (store, runner, bus) = parts();
    let result = QueueSchedulerBuilder::on_current_runtime(store, runner, bus);
    assert!(matches!(result, Err(SchedulerError::NoRuntime(_))));
}
