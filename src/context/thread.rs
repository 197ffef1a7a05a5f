//! Per-thread reference memory
//!
//! Remembers the last, recent and pinned task/project ids of a conversation
//! thread. Callers always receive an independent copy from `load` and write
//! back explicitly with `save`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::RepoResult;
use crate::repository::EntityRecord;
use crate::validation::ResolvedReference;

/// Upper bound on the recent id lists
pub const MAX_RECENT_IDS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadContext {
    pub thread_id: String,
    pub last_task_id: Option<String>,
    pub last_project_id: Option<String>,
    /// Most recent first, de-duplicated
    #[serde(default)]
    pub recent_task_ids: Vec<String>,
    /// Most recent first, de-duplicated
    #[serde(default)]
    pub recent_project_ids: Vec<String>,
    pub pinned_task_id: Option<String>,
    pub pinned_project_id: Option<String>,
}

impl ThreadContext {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            ..Default::default()
        }
    }

    pub fn touch_task(&mut self, id: &str, limit: usize) {
        self.last_task_id = Some(id.to_string());
        push_recent(&mut self.recent_task_ids, id, limit);
    }

    pub fn touch_project(&mut self, id: &str, limit: usize) {
        self.last_project_id = Some(id.to_string());
        push_recent(&mut self.recent_project_ids, id, limit);
    }

    /// Record resolved references in order; the last one becomes the most recent.
    ///
    /// A task reference also refreshes the project the task belongs to.
    pub fn apply_references(&mut self, references: &[ResolvedReference], limit: usize) {
        for resolved in references {
            match &resolved.record {
                EntityRecord::Task(task) => {
                    if let Some(project_id) = &task.project_id {
                        self.touch_project(project_id, limit);
                    }
                    self.touch_task(&task.id, limit);
                }
                EntityRecord::Project(project) => self.touch_project(&project.id, limit),
                EntityRecord::Action(_) => {}
            }
        }
    }

    pub fn pin_task(&mut self, id: impl Into<String>) {
        self.pinned_task_id = Some(id.into());
    }

    pub fn pin_project(&mut self, id: impl Into<String>) {
        self.pinned_project_id = Some(id.into());
    }

    pub fn clear_pins(&mut self) {
        self.pinned_task_id = None;
        self.pinned_project_id = None;
    }
}

fn push_recent(list: &mut Vec<String>, id: &str, limit: usize) {
    list.retain(|existing| existing != id);
    list.insert(0, id.to_string());
    list.truncate(limit.clamp(1, MAX_RECENT_IDS));
}

/// Storage for thread contexts
#[async_trait]
pub trait ThreadContextStore: Send + Sync {
    /// Load (creating an empty record on first use) and return a copy
    async fn load(&self, thread_id: &str) -> RepoResult<ThreadContext>;

    async fn save(&self, context: &ThreadContext) -> RepoResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryThreadContextStore {
    contexts: RwLock<HashMap<String, ThreadContext>>,
}

impl InMemoryThreadContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadContextStore for InMemoryThreadContextStore {
    async fn load(&self, thread_id: &str) -> RepoResult<ThreadContext> {
        let mut contexts = self.contexts.write().await;
        Ok(contexts
            .entry(thread_id.to_string())
            .or_insert_with(|| ThreadContext::new(thread_id))
            .clone())
    }

    async fn save(&self, context: &ThreadContext) -> RepoResult<()> {
        let mut contexts = self.contexts.write().await;
        contexts.insert(context.thread_id.clone(), context.clone());
        Ok(())
    }
}
