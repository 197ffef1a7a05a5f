//! Execution result shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ops::{ActionState, LlmOperation, TaskStatus};

/// State captured before an operation was applied, used by undo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorState {
    CreatedTask {
        task_id: String,
    },
    TaskStatus {
        task_id: String,
        previous_status: TaskStatus,
    },
    ActionLink {
        action_id: String,
        task_id: String,
    },
    ActionState {
        action_id: String,
        previous_state: ActionState,
        previous_defer_until: Option<DateTime<Utc>>,
        previous_added_to_today: Option<bool>,
    },
    DeletedProjects {
        project_ids: Vec<String>,
        #[serde(default)]
        cascaded_task_ids: Vec<String>,
    },
    DeletedTasks {
        task_ids: Vec<String>,
    },
}

/// An operation that was applied; semantic references are replaced by ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedOperation {
    #[serde(flatten)]
    pub operation: LlmOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_state: Option<PriorState>,
}

impl AppliedOperation {
    pub fn new(operation: LlmOperation, prior_state: Option<PriorState>) -> Self {
        Self {
            operation,
            prior_state,
        }
    }
}

/// An operation that failed, as proposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedOperation {
    #[serde(flatten)]
    pub operation: LlmOperation,
    pub error: String,
}

/// `{applied, pending, errors}`, each in input order
///
/// Every input operation lands in exactly one list. Fallback chat messages
/// synthesized for failures are additional entries in `applied`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub applied: Vec<AppliedOperation>,
    pub pending: Vec<LlmOperation>,
    pub errors: Vec<FailedOperation>,
}

impl ExecutionResult {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.pending.is_empty() && self.errors.is_empty()
    }

    /// Names of the applied operations, in order
    pub fn applied_names(&self) -> Vec<&'static str> {
        self.applied.iter().map(|a| a.operation.name()).collect()
    }
}

/// Outcome of running one operation the user explicitly approved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Applied(AppliedOperation),
    /// Name conflict, carrying the user-facing message
    Conflict { message: String },
    Failed { error: String },
}
