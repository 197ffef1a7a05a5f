//! Workspace records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ops::{ActionState, Priority, TaskStatus};

/// Kind of entity a reference can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Task,
    Project,
    Action,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Task => "task",
            EntityKind::Project => "project",
            EntityKind::Action => "action",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "task" => Ok(EntityKind::Task),
            "project" => Ok(EntityKind::Project),
            "action" | "action_item" => Ok(EntityKind::Action),
            other => Err(format!("unsupported entity type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProjectRecord {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub project_id: Option<String>,
    pub status: TaskStatus,
    pub importance: Option<Priority>,
    pub description: Option<String>,
    pub from_action_id: Option<String>,
    /// Join relation with action items
    #[serde(default)]
    pub action_ids: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Visible in normal task listings
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none() && !self.archived
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItemRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub state: ActionState,
    pub defer_until: Option<DateTime<Utc>>,
    pub added_to_today: Option<bool>,
    /// Primary task pointer
    pub task_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Assistant message delivered to a conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub thread_id: String,
    pub owner_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Input for `create_task`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub project_id: Option<String>,
    pub importance: Option<Priority>,
    pub description: Option<String>,
    pub from_action_id: Option<String>,
}

/// Partial update for an action item. `Some(None)` clears a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStatePatch {
    pub state: Option<ActionState>,
    pub defer_until: Option<Option<DateTime<Utc>>>,
    pub added_to_today: Option<Option<bool>>,
}

/// Result of a project delete: the projects plus tasks deleted alongside them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedProjects {
    pub projects: Vec<ProjectRecord>,
    pub cascaded_tasks: Vec<TaskRecord>,
}

/// Any record a reference can resolve to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum EntityRecord {
    Task(TaskRecord),
    Project(ProjectRecord),
    Action(ActionItemRecord),
}

impl EntityRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRecord::Task(_) => EntityKind::Task,
            EntityRecord::Project(_) => EntityKind::Project,
            EntityRecord::Action(_) => EntityKind::Action,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EntityRecord::Task(t) => &t.id,
            EntityRecord::Project(p) => &p.id,
            EntityRecord::Action(a) => &a.id,
        }
    }

    /// Display name (`title` for tasks/actions, `name` for projects)
    pub fn label(&self) -> &str {
        match self {
            EntityRecord::Task(t) => &t.title,
            EntityRecord::Project(p) => &p.name,
            EntityRecord::Action(a) => &a.title,
        }
    }
}
