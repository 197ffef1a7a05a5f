//! Context snapshot handed to the resolver

use serde::{Deserialize, Serialize};

use crate::repository::{ActionItemRecord, ProjectRecord, TaskRecord};

/// Records already loaded by the caller
///
/// When no snapshot is supplied the resolver loads the owner's records from
/// the repository instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub actions: Vec<ActionItemRecord>,
}

impl ContextSnapshot {
    pub fn task(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// Focus ids used to resolve "this task" and friends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveFocus {
    pub task_id: Option<String>,
    pub action_id: Option<String>,
}

impl ResolveFocus {
    pub fn task(id: impl Into<String>) -> Self {
        Self {
            task_id: Some(id.into()),
            action_id: None,
        }
    }
}

/// Something the resolver can match by name
pub(crate) trait Named {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl Named for TaskRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.title
    }
}

impl Named for ProjectRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ActionItemRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.title
    }
}
