//! Tests for audit sink

use std::sync::Arc;

use parking_lot::Mutex;
use prometheus_agent_queue::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event("p1", Some("task1"), AuditAction::Admitted, None);
    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].project_id, "p1");
    assert_eq!(events[0].task_id.as_deref(), Some("task1"));
    assert_eq!(events[0].action, AuditAction::Admitted);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("p1", Some("task1"), AuditAction::Admitted, None));
    sink.record(build_audit_event("p1", Some("task2"), AuditAction::Admitted, None));
    sink.record(build_audit_event("p1", Some("task3"), AuditAction::StartFailed, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id.as_deref(), Some("task2")); // First one popped
    assert_eq!(events[1].task_id.as_deref(), Some("task3"));
    assert_eq!(sink.events_with(AuditAction::StartFailed).len(), 1);
}

#[test]
fn test_zero_capacity_sink_keeps_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event("", None, AuditAction::Stopped, None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_build_audit_event() {
    let a = build_audit_event("p1", Some("task1"), AuditAction::SkippedUnparsable, Some("yesterday".into()));
    let b = build_audit_event("p1", None, AuditAction::ShutdownRequested, None);

    assert_ne!(a.event_id, b.event_id);
    assert_eq!(a.detail.as_deref(), Some("yesterday"));
    assert!(b.task_id.is_none());
    assert!(a.created_at_ms > 0);
    assert_eq!(a.action.to_string(), "skipped_unparsable");
}

#[test]
fn test_shared_sink_records_through_handle() {
    let shared = Arc::new(Mutex::new(InMemoryAuditSink::new(4)));
    let mut boxed: Box<dyn AuditSink> = Box::new(shared.clone());
    boxed.record(build_audit_event("p1", Some("t"), AuditAction::Exited, None));
    assert_eq!(shared.lock().events_with(AuditAction::Exited).len(), 1);
}
