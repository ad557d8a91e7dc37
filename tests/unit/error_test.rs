//! Tests for error types

use prometheus_agent_queue::core::{SchedulerError, StartError};

#[test]
fn test_unknown_project_error() {
    let err = SchedulerError::UnknownProject("p1".to_string());
    assert_eq!(format!("{}", err), "unknown project: p1");
}

#[test]
fn test_store_error() {
    let err = SchedulerError::Store("connection failed".to_string());
    assert_eq!(format!("{}", err), "task store error: connection failed");
}

#[test]
fn test_pass_panicked_error() {
    let err = SchedulerError::PassPanicked("boom".to_string());
    assert_eq!(format!("{}", err), "admission pass panicked: boom");
}

#[test]
fn test_start_errors() {
    let running = StartError::AlreadyRunning("t1".to_string());
    assert_eq!(format!("{}", running), "task t1 is already running");

    let failed = StartError::Failed("no worktree".to_string());
    assert_eq!(format!("{}", failed), "failed to start execution: no worktree");
    assert_ne!(running, failed);
}

#[test]
fn test_errors_convert_to_anyhow() {
    fn load() -> prometheus_agent_queue::core::AppResult<()> {
        Err(SchedulerError::InvalidConfig("status_event must not be empty".into()).into())
    }
    let err = load().unwrap_err();
    assert!(err.to_string().contains("status_event"));
}
