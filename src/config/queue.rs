//! Queue and scheduler configuration structures.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Event name used for status snapshots unless overridden.
pub const DEFAULT_STATUS_EVENT: &str = "queue-status-update";

const ENV_STATUS_EVENT: &str = "AGENT_QUEUE_STATUS_EVENT";
const ENV_RETRIGGER_ON_EXIT: &str = "AGENT_QUEUE_RETRIGGER_ON_EXIT";
const ENV_CHAIN_DEPTH_WARN: &str = "AGENT_QUEUE_CHAIN_DEPTH_WARN";

/// Per-project queue settings, owned by the task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    /// Whether backlog tasks are admitted automatically.
    pub enabled: bool,
    /// Maximum number of concurrently running tasks for the project.
    pub max_concurrent: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_concurrent: 1,
        }
    }
}

impl QueueConfig {
    /// Enabled queue with the given concurrency ceiling.
    pub const fn enabled_with(max_concurrent: u32) -> Self {
        Self {
            enabled: true,
            max_concurrent,
        }
    }

    /// Validate queue configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".into());
        }
        Ok(())
    }

    /// Concurrency ceiling with a stored zero read as one.
    pub fn effective_max_concurrent(&self) -> usize {
        self.max_concurrent.max(1) as usize
    }
}

/// Scheduler-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Event name passed to the status sink with every snapshot.
    pub status_event: String,
    /// Run an admission pass for a project whenever one of its executions exits.
    pub retrigger_on_exit: bool,
    /// Pending-pass depth above which a project's chain logs a warning.
    pub chain_depth_warn: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            status_event: DEFAULT_STATUS_EVENT.to_owned(),
            retrigger_on_exit: true,
            chain_depth_warn: 16,
        }
    }
}

impl SchedulerConfig {
    /// Validate scheduler configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.status_event.trim().is_empty() {
            return Err("status_event must not be empty".into());
        }
        if self.chain_depth_warn == 0 {
            return Err("chain_depth_warn must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    /// Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading a `.env`
    /// file first if one is present. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        if let Some(err) = dotenv_failure(dotenvy::dotenv()) {
            warn!(error = %err, "ignoring unreadable .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(event) = lookup(ENV_STATUS_EVENT) {
            cfg.status_event = event;
        }
        if let Some(raw) = lookup(ENV_RETRIGGER_ON_EXIT) {
            cfg.retrigger_on_exit = parse_bool(&raw)
                .ok_or_else(|| format!("{ENV_RETRIGGER_ON_EXIT}: expected a boolean, got `{raw}`"))?;
        }
        if let Some(raw) = lookup(ENV_CHAIN_DEPTH_WARN) {
            cfg.chain_depth_warn = raw
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_CHAIN_DEPTH_WARN}: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// A missing `.env` is normal. Parse and read errors are returned.
fn dotenv_failure(result: Result<PathBuf, dotenvy::Error>) -> Option<dotenvy::Error> {
    match result {
        Ok(path) => {
            debug!(path = %path.display(), "loaded .env");
            None
        }
        Err(err) if err.not_found() => None,
        Err(err) => Some(err),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
