//! Execution results and stage traces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An intermediate step recorded for roles with `verbose` enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceStep {
    /// Raw text returned by one generation call.
    Response { role: String, text: String },
    /// A search issued on behalf of a role.
    Search {
        role: String,
        query: String,
        limit: u32,
        hits: usize,
    },
    /// A completed delegation round.
    Delegation {
        from: String,
        to: String,
        request: String,
        answer: String,
        depth: usize,
    },
}

/// Output of one completed work unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    /// Work unit name.
    pub unit: String,
    /// Role that produced the output.
    pub role: String,
    pub output: String,
    /// Intermediate steps; empty unless the role is verbose.
    pub steps: Vec<TraceStep>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed { unit: String, reason: String },
    /// The cancel signal fired before `before_unit` started.
    Cancelled { before_unit: String },
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub run_id: Uuid,
    pub topic: String,
    /// Output of the last unit on success; empty otherwise.
    pub final_output: String,
    /// Completed stages in execution order.
    pub stage_outputs: Vec<StageOutput>,
    pub status: RunStatus,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }

    /// The single-line failure reason, if the run did not complete.
    pub fn failure_reason(&self) -> Option<String> {
        match &self.status {
            RunStatus::Completed => None,
            RunStatus::Failed { unit, reason } => {
                Some(format!("work unit '{unit}' failed: {reason}"))
            }
            RunStatus::Cancelled { before_unit } => {
                Some(format!("run cancelled before work unit '{before_unit}'"))
            }
        }
    }

    /// Output of the named unit, if it completed.
    pub fn stage(&self, unit: &str) -> Option<&StageOutput> {
        self.stage_outputs.iter().find(|s| s.unit == unit)
    }

    pub fn completed_count(&self) -> usize {
        self.stage_outputs.len()
    }
}

/// Collapse a reason to one line.
pub(crate) fn single_line(reason: &str) -> String {
    reason.split_whitespace().collect::<Vec<_>>().join(" ")
}
