//! Tests for configuration validation

use prometheus_agent_queue::config::{QueueConfig, SchedulerConfig, DEFAULT_STATUS_EVENT};

#[test]
fn test_queue_config_defaults() {
    let config = QueueConfig::default();
    assert!(!config.enabled);
    assert_eq!(config.max_concurrent, 1);
    assert!(config.validate().is_ok());
}

#[test]
fn test_queue_config_invalid_max_concurrent() {
    let invalid = QueueConfig {
        enabled: true,
        max_concurrent: 0,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_queue_config_camel_case() {
    let config: QueueConfig = serde_json::from_str(r#"{"enabled":true,"maxConcurrent":3}"#).unwrap();
    assert_eq!(config, QueueConfig::enabled_with(3));
}

#[test]
fn test_scheduler_config_defaults() {
    let config = SchedulerConfig::default();
    assert_eq!(config.status_event, DEFAULT_STATUS_EVENT);
    assert!(config.retrigger_on_exit);
    assert_eq!(config.chain_depth_warn, 16);
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_event() {
    let invalid = SchedulerConfig {
        status_event: "  ".to_string(),
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_depth() {
    let invalid = SchedulerConfig {
        chain_depth_warn: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let config = SchedulerConfig::from_json_str(r#"{"retrigger_on_exit": false}"#).unwrap();
    assert!(!config.retrigger_on_exit);
    assert_eq!(config.status_event, DEFAULT_STATUS_EVENT);

    assert!(SchedulerConfig::from_json_str(r#"{"status_event": ""}"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}
