//! Operation domain model
//!
//! `LlmOperation` is the closed set of changes an agent may propose. The only
//! way to obtain one from untyped data is `LlmOperation::from_record` (or
//! `from_parsed_op` for inline op tokens), which checks required arguments
//! and enumerated values. Unknown operations are rejected there and never
//! represented.
//!
//! | op                    | required                   | optional                                      |
//! |-----------------------|----------------------------|-----------------------------------------------|
//! | `chat`                | `message`                  |                                               |
//! | `create_task`         | `title`                    | `project`, `priority`, `description`, `from_action` |
//! | `update_task_status`  | `task`, `status`           |                                               |
//! | `link_action_to_task` | `action`, `task`           |                                               |
//! | `update_action_state` | `action` + one of the rest | `state`, `defer_until`, `added_to_today`      |
//! | `delete_project`      | `projects`                 |                                               |
//! | `delete_task`         | `tasks`                    |                                               |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::warn;

use super::values::{ActionState, Priority, TaskStatus};
use crate::error::OperationError;
use crate::tokens::ParsedOp;

// =============================================================================
// OPERATION TYPES
// =============================================================================

/// A validated operation proposed by the agent
///
/// Serializes as `{"op": "<name>", "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "params", rename_all = "snake_case")]
pub enum LlmOperation {
    Chat(ChatParams),
    CreateTask(CreateTaskParams),
    UpdateTaskStatus(UpdateTaskStatusParams),
    LinkActionToTask(LinkActionToTaskParams),
    UpdateActionState(UpdateActionStateParams),
    DeleteProject(DeleteProjectParams),
    DeleteTask(DeleteTaskParams),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatParams {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskParams {
    pub title: String,
    /// Project reference: id, name or alias
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Action item the task is created from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskStatusParams {
    pub task: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkActionToTaskParams {
    pub action: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateActionStateParams {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ActionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defer_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_to_today: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteProjectParams {
    pub projects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTaskParams {
    pub tasks: Vec<String>,
}

pub const OP_CHAT: &str = "chat";
pub const OP_CREATE_TASK: &str = "create_task";
pub const OP_UPDATE_TASK_STATUS: &str = "update_task_status";
pub const OP_LINK_ACTION_TO_TASK: &str = "link_action_to_task";
pub const OP_UPDATE_ACTION_STATE: &str = "update_action_state";
pub const OP_DELETE_PROJECT: &str = "delete_project";
pub const OP_DELETE_TASK: &str = "delete_task";

impl LlmOperation {
    /// Wire name of the operation
    pub fn name(&self) -> &'static str {
        match self {
            LlmOperation::Chat(_) => OP_CHAT,
            LlmOperation::CreateTask(_) => OP_CREATE_TASK,
            LlmOperation::UpdateTaskStatus(_) => OP_UPDATE_TASK_STATUS,
            LlmOperation::LinkActionToTask(_) => OP_LINK_ACTION_TO_TASK,
            LlmOperation::UpdateActionState(_) => OP_UPDATE_ACTION_STATE,
            LlmOperation::DeleteProject(_) => OP_DELETE_PROJECT,
            LlmOperation::DeleteTask(_) => OP_DELETE_TASK,
        }
    }

    pub fn chat(message: impl Into<String>) -> Self {
        LlmOperation::Chat(ChatParams {
            message: message.into(),
        })
    }

    /// Parameters as a JSON object
    pub fn params_json(&self) -> Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("params").map(Value::take))
            .unwrap_or(Value::Null)
    }

    /// Validated construction from an untyped record
    ///
    /// Accepts `{"op": name, "params": {...}}` or a flat object carrying `op`
    /// (or `type`) alongside the arguments.
    pub fn from_record(record: &Value) -> Result<Self, OperationError> {
        let obj = record.as_object().ok_or(OperationError::NotAnObject)?;
        let op = obj
            .get("op")
            .or_else(|| obj.get("type"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .ok_or(OperationError::MissingOpName)?;

        match obj.get("params") {
            Some(Value::Object(params)) => Self::from_parts(&op, params),
            None | Some(Value::Null) => Self::from_parts(&op, obj),
            Some(_) => Err(OperationError::InvalidArgumentType {
                op: static_name(&op).ok_or_else(|| OperationError::UnknownOperation {
                    op: op.clone(),
                })?,
                arg: "params",
                expected: "an object",
            }),
        }
    }

    /// Validated construction from an inline `[op ...]` token
    pub fn from_parsed_op(parsed: &ParsedOp) -> Result<Self, OperationError> {
        let params: Map<String, Value> = parsed
            .args
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Self::from_parts(&parsed.op_type, &params)
    }

    fn from_parts(op: &str, params: &Map<String, Value>) -> Result<Self, OperationError> {
        let name = static_name(op).ok_or_else(|| OperationError::UnknownOperation {
            op: op.to_string(),
        })?;
        let args = Args { op: name, params };

        let operation = match name {
            OP_CHAT => LlmOperation::Chat(ChatParams {
                message: args.required_string("message", &["text"])?,
            }),
            OP_CREATE_TASK => LlmOperation::CreateTask(CreateTaskParams {
                title: args.required_string("title", &["name"])?,
                project: args.string("project", &["project_id"])?,
                priority: args.enumerated("priority", &["importance"], Priority::allowed)?,
                description: args.string("description", &[])?,
                from_action: args.string("from_action", &["from_action_id", "action_id"])?,
            }),
            OP_UPDATE_TASK_STATUS => LlmOperation::UpdateTaskStatus(UpdateTaskStatusParams {
                task: args.required_string("task", &["task_id"])?,
                status: args
                    .enumerated("status", &[], TaskStatus::allowed)?
                    .ok_or(OperationError::MissingArgument {
                        op: name,
                        arg: "status",
                    })?,
            }),
            OP_LINK_ACTION_TO_TASK => LlmOperation::LinkActionToTask(LinkActionToTaskParams {
                action: args.required_string("action", &["action_id"])?,
                task: args.required_string("task", &["task_id"])?,
            }),
            OP_UPDATE_ACTION_STATE => {
                let params = UpdateActionStateParams {
                    action: args.required_string("action", &["action_id"])?,
                    state: args.enumerated("state", &[], ActionState::allowed)?,
                    defer_until: args.datetime("defer_until", &[])?,
                    added_to_today: args.boolean("added_to_today", &[])?,
                };
                if params.state.is_none()
                    && params.defer_until.is_none()
                    && params.added_to_today.is_none()
                {
                    return Err(OperationError::MissingArgument {
                        op: name,
                        arg: "state",
                    });
                }
                LlmOperation::UpdateActionState(params)
            }
            OP_DELETE_PROJECT => LlmOperation::DeleteProject(DeleteProjectParams {
                projects: args.required_list(
                    "projects",
                    &["project_ids", "project", "project_id"],
                )?,
            }),
            OP_DELETE_TASK => LlmOperation::DeleteTask(DeleteTaskParams {
                tasks: args.required_list("tasks", &["task_ids", "task", "task_id"])?,
            }),
            _ => {
                return Err(OperationError::UnknownOperation {
                    op: op.to_string(),
                })
            }
        };
        Ok(operation)
    }
}

impl<'de> Deserialize<'de> for LlmOperation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Value::deserialize(deserializer)?;
        LlmOperation::from_record(&record).map_err(serde::de::Error::custom)
    }
}

fn static_name(op: &str) -> Option<&'static str> {
    [
        OP_CHAT,
        OP_CREATE_TASK,
        OP_UPDATE_TASK_STATUS,
        OP_LINK_ACTION_TO_TASK,
        OP_UPDATE_ACTION_STATE,
        OP_DELETE_PROJECT,
        OP_DELETE_TASK,
    ]
    .into_iter()
    .find(|name| *name == op)
}

/// Parse a batch of proposed operations, skipping malformed entries
///
/// Accepts a JSON array, `{"operations": [...]}`, or a single operation
/// object. A malformed entry is logged and dropped; it never fails the batch.
pub fn parse_operation_batch(proposed: &Value) -> Vec<LlmOperation> {
    let entries: Vec<&Value> = match proposed {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match obj.get("operations") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![proposed],
        },
        Value::Null => Vec::new(),
        other => vec![other],
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match LlmOperation::from_record(entry) {
            Ok(op) => Some(op),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed proposed operation");
                None
            }
        })
        .collect()
}

// =============================================================================
// ARGUMENT ACCESS
// =============================================================================

struct Args<'a> {
    op: &'static str,
    params: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    /// First non-null value among the argument and its aliases
    fn raw(&self, arg: &str, aliases: &[&str]) -> Option<&'a Value> {
        std::iter::once(arg)
            .chain(aliases.iter().copied())
            .filter_map(|key| self.params.get(key))
            .find(|v| !v.is_null())
    }

    fn string(&self, arg: &'static str, aliases: &[&str]) -> Result<Option<String>, OperationError> {
        match self.raw(arg, aliases) {
            None => Ok(None),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(OperationError::InvalidArgumentType {
                op: self.op,
                arg,
                expected: "a string",
            }),
        }
    }

    fn required_string(&self, arg: &'static str, aliases: &[&str]) -> Result<String, OperationError> {
        self.string(arg, aliases)?
            .ok_or(OperationError::MissingArgument { op: self.op, arg })
    }

    fn enumerated<T: FromStr>(
        &self,
        arg: &'static str,
        aliases: &[&str],
        allowed: fn() -> String,
    ) -> Result<Option<T>, OperationError> {
        match self.string(arg, aliases)? {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| OperationError::InvalidValue {
                    op: self.op,
                    arg,
                    value: raw,
                    allowed: allowed(),
                }),
        }
    }

    fn boolean(&self, arg: &'static str, aliases: &[&str]) -> Result<Option<bool>, OperationError> {
        match self.raw(arg, aliases) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" => Ok(Some(false)),
                _ => Err(OperationError::InvalidValue {
                    op: self.op,
                    arg,
                    value: s.clone(),
                    allowed: "true, false".to_string(),
                }),
            },
            Some(_) => Err(OperationError::InvalidArgumentType {
                op: self.op,
                arg,
                expected: "a boolean",
            }),
        }
    }

    fn datetime(
        &self,
        arg: &'static str,
        aliases: &[&str],
    ) -> Result<Option<DateTime<Utc>>, OperationError> {
        let Some(raw) = self.string(arg, aliases)? else {
            return Ok(None);
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Some(naive.and_utc()))
            .ok_or(OperationError::InvalidValue {
                op: self.op,
                arg,
                value: raw,
                allowed: "RFC3339 timestamp or YYYY-MM-DD".to_string(),
            })
    }

    /// Array of ids, or a single string (comma-separated values allowed)
    fn required_list(
        &self,
        arg: &'static str,
        aliases: &[&str],
    ) -> Result<Vec<String>, OperationError> {
        let items: Vec<String> = match self.raw(arg, aliases) {
            None => Vec::new(),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s.trim().to_string()),
                    Value::Number(n) => Ok(n.to_string()),
                    _ => Err(OperationError::InvalidArgumentType {
                        op: self.op,
                        arg,
                        expected: "a list of strings",
                    }),
                })
                .collect::<Result<_, _>>()?,
            Some(Value::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
            Some(_) => {
                return Err(OperationError::InvalidArgumentType {
                    op: self.op,
                    arg,
                    expected: "a list of strings",
                })
            }
        };

        let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
        if items.is_empty() {
            return Err(OperationError::MissingArgument { op: self.op, arg });
        }
        Ok(items)
    }
}
