//! Tests for tokio spawner utilities

use prometheus_agent_queue::core::{SchedulerError, Spawn};
use prometheus_agent_queue::runtime::tokio_spawner::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_current_requires_runtime() {
    let err = TokioSpawner::current().unwrap_err();
    assert!(matches!(err, SchedulerError::NoRuntime(_)));
}

#[tokio::test]
async fn test_current_inside_runtime() {
    assert!(TokioSpawner::current().is_ok());
}
