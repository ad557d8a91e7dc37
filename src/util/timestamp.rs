//! Tolerant parsing of task creation timestamps.
//!
//! Task records written by older clients store `createdAt` as whatever the
//! writer had at hand: a proper timestamp, epoch milliseconds, or a loosely
//! formatted string. Parsing never fails hard; values that cannot be read
//! come back as [`ParsedTimestamp::Unparsable`] so the caller can skip the
//! task for this pass and try again later.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Naive layouts accepted after RFC 3339 / RFC 2822 fail. Read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Creation time as stored on a task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedAt {
    /// Structured timestamp.
    At(DateTime<Utc>),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// Free-form text, parsed on demand.
    Text(String),
}

/// Result of interpreting a [`CreatedAt`] value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTimestamp {
    /// A comparable instant.
    Valid(DateTime<Utc>),
    /// The raw value that could not be interpreted.
    Unparsable(String),
}

impl ParsedTimestamp {
    /// The parsed instant, if any.
    pub fn valid(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Valid(at) => Some(at),
            Self::Unparsable(_) => None,
        }
    }

    /// Whether the value could be interpreted.
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

impl CreatedAt {
    /// Interpret the stored value.
    pub fn parse(&self) -> ParsedTimestamp {
        match self {
            Self::At(at) => ParsedTimestamp::Valid(*at),
            Self::EpochMillis(ms) => from_millis(*ms, &ms.to_string()),
            Self::Text(raw) => parse_text(raw),
        }
    }
}

impl From<DateTime<Utc>> for CreatedAt {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}

impl From<&str> for CreatedAt {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_owned())
    }
}

impl From<String> for CreatedAt {
    fn from(raw: String) -> Self {
        Self::Text(raw)
    }
}

fn from_millis(ms: i64, raw: &str) -> ParsedTimestamp {
    DateTime::from_timestamp_millis(ms)
        .map_or_else(|| ParsedTimestamp::Unparsable(raw.to_owned()), ParsedTimestamp::Valid)
}

fn parse_text(raw: &str) -> ParsedTimestamp {
    let s = raw.trim();
    if s.is_empty() {
        return ParsedTimestamp::Unparsable(raw.to_owned());
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return match s.parse::<i64>() {
            Ok(ms) => from_millis(ms, raw),
            Err(_) => ParsedTimestamp::Unparsable(raw.to_owned()),
        };
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return ParsedTimestamp::Valid(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(s) {
        return ParsedTimestamp::Valid(at.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return ParsedTimestamp::Valid(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return ParsedTimestamp::Valid(naive.and_utc());
    }

    ParsedTimestamp::Unparsable(raw.to_owned())
}
