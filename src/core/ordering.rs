//! Admission ordering for backlog candidates.
//!
//! Higher priority admits first; within a priority the oldest task wins.
//! The sort is stable, so tasks with identical priority and creation time
//! keep the order the task store listed them in.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::core::store::Task;
use crate::util::serde::TaskId;
use crate::util::timestamp::ParsedTimestamp;

/// A backlog task with a usable creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The task record.
    pub task: Task,
    /// Parsed creation time.
    pub created_at: DateTime<Utc>,
}

/// A backlog task left out of this pass because its creation time could not
/// be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparsableTask {
    /// Task identifier.
    pub task_id: TaskId,
    /// The raw stored value.
    pub raw: String,
}

/// Backlog split into admissible candidates (in admission order) and
/// excluded tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSelection {
    /// Candidates sorted by [`admission_order`].
    pub ordered: Vec<Candidate>,
    /// Tasks skipped for this pass.
    pub unparsable: Vec<UnparsableTask>,
}

/// Priority rank descending, then creation time ascending.
pub fn admission_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.task
        .priority
        .rank()
        .cmp(&a.task.priority.rank())
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Parse creation times, drop unparsable tasks, and sort the rest.
pub fn select_candidates(tasks: Vec<Task>) -> CandidateSelection {
    let mut selection = CandidateSelection::default();
    for task in tasks {
        match task.created_at.parse() {
            ParsedTimestamp::Valid(created_at) => {
                selection.ordered.push(Candidate { task, created_at });
            }
            ParsedTimestamp::Unparsable(raw) => {
                selection.unparsable.push(UnparsableTask {
                    task_id: task.id,
                    raw,
                });
            }
        }
    }
    selection.ordered.sort_by(admission_order);
    selection
}
