//! Tests for utility functions

use chrono::{TimeZone, Utc};
use prometheus_agent_queue::util::{now_ms, CreatedAt, ParsedTimestamp, Priority, ProjectId, TaskId};

#[test]
fn test_priority_ordering() {
    assert!(Priority::Urgent > Priority::High);
    assert!(Priority::High > Priority::Medium);
    assert!(Priority::Medium > Priority::Low);
    assert_eq!(Priority::default(), Priority::Medium);
}

#[test]
fn test_priority_from_json() {
    let p: Priority = serde_json::from_str("\"urgent\"").unwrap();
    assert_eq!(p, Priority::Urgent);
    assert!(serde_json::from_str::<Priority>("\"critical\"").is_err());
}

#[test]
fn test_ids_are_strings() {
    let task: TaskId = "task-1".to_string();
    let project: ProjectId = "project-1".to_string();
    assert_ne!(task, project);
}

#[test]
fn test_created_at_representations() {
    let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let forms = [
        CreatedAt::from(expected),
        CreatedAt::EpochMillis(1_704_067_200_000),
        CreatedAt::from("2024-01-01T00:00:00Z"),
        CreatedAt::from("2024-01-01 00:00:00"),
        CreatedAt::from("2024-01-01"),
        CreatedAt::from("1704067200000"),
    ];
    for form in forms {
        assert_eq!(form.parse(), ParsedTimestamp::Valid(expected), "{form:?}");
    }
}

#[test]
fn test_created_at_unparsable_keeps_raw() {
    let parsed = CreatedAt::from("not a date").parse();
    assert!(!parsed.is_valid());
    assert_eq!(parsed, ParsedTimestamp::Unparsable("not a date".into()));
    assert!(parsed.valid().is_none());
}

#[test]
fn test_created_at_from_json() {
    let text: CreatedAt = serde_json::from_str("\"last tuesday\"").unwrap();
    assert_eq!(text, CreatedAt::Text("last tuesday".into()));
    let millis: CreatedAt = serde_json::from_str("1704067200000").unwrap();
    assert_eq!(millis, CreatedAt::EpochMillis(1_704_067_200_000));
}

#[test]
fn test_now_ms_is_recent() {
    assert!(now_ms() > 1_704_067_200_000);
}
