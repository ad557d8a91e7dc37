//! Shared identifier and priority types.

use serde::{Deserialize, Serialize};

/// Task identifier as issued by the task store.
pub type TaskId = String;

/// Project identifier as issued by the task store.
pub type ProjectId = String;

/// Task priority. Variants are declared lowest first so the derived `Ord`
/// ranks `Urgent` highest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Lowest priority.
    Low,
    /// Default priority.
    #[default]
    Medium,
    /// Elevated priority.
    High,
    /// Admitted before everything else.
    Urgent,
}

impl Priority {
    /// Numeric rank used by the admission comparator (higher admits first).
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Urgent => 3,
        }
    }
}
