//! Workspace repository collaborator
//!
//! The protocol never talks to storage directly; every read and write goes
//! through `WorkspaceRepository`. Reads return a record or `RepoError::NotFound`,
//! writes return the resulting record or fail (`DuplicateName` on a name
//! conflict). Destructive calls are soft deletes so undo can restore them.
//!
//! `InMemoryWorkspace` is a complete backend for tests, demos and the CLI.

pub mod memory;
pub mod types;

use async_trait::async_trait;

use crate::error::{RepoError, RepoResult};
use crate::ops::TaskStatus;

pub use memory::InMemoryWorkspace;
pub use types::{
    ActionItemRecord, ActionStatePatch, DeletedProjects, EntityKind, EntityRecord, NewTask,
    ProjectRecord, TaskRecord, ThreadMessage,
};

#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Task by id (archived tasks included, soft-deleted excluded)
    async fn get_task(&self, owner: &str, id: &str) -> RepoResult<TaskRecord>;

    /// Active tasks
    async fn get_tasks(&self, owner: &str) -> RepoResult<Vec<TaskRecord>>;

    /// Active projects
    async fn get_projects(&self, owner: &str) -> RepoResult<Vec<ProjectRecord>>;

    async fn get_action_item(&self, owner: &str, id: &str) -> RepoResult<ActionItemRecord>;

    async fn get_action_items(&self, owner: &str) -> RepoResult<Vec<ActionItemRecord>>;

    async fn create_task(&self, owner: &str, task: NewTask) -> RepoResult<TaskRecord>;

    async fn update_task_status(
        &self,
        owner: &str,
        id: &str,
        status: TaskStatus,
    ) -> RepoResult<TaskRecord>;

    /// Set or clear the action item's primary task pointer
    async fn update_action_task_link(
        &self,
        owner: &str,
        action_id: &str,
        task_id: Option<&str>,
    ) -> RepoResult<ActionItemRecord>;

    /// Add the task/action join relation
    async fn create_task_action_link(
        &self,
        owner: &str,
        task_id: &str,
        action_id: &str,
    ) -> RepoResult<TaskRecord>;

    /// Remove the task/action join relation
    async fn remove_task_action_link(
        &self,
        owner: &str,
        task_id: &str,
        action_id: &str,
    ) -> RepoResult<TaskRecord>;

    async fn update_action_state(
        &self,
        owner: &str,
        id: &str,
        patch: ActionStatePatch,
    ) -> RepoResult<ActionItemRecord>;

    /// Soft-delete projects; their active tasks are deleted alongside them
    async fn delete_projects(&self, owner: &str, ids: &[String]) -> RepoResult<DeletedProjects>;

    /// Soft-delete tasks
    async fn delete_tasks(&self, owner: &str, ids: &[String]) -> RepoResult<Vec<TaskRecord>>;

    /// Hide a task from active listings without deleting it
    async fn archive_task(&self, owner: &str, id: &str) -> RepoResult<TaskRecord>;

    /// Clear the soft-delete marker on projects
    async fn restore_projects(&self, owner: &str, ids: &[String]) -> RepoResult<Vec<ProjectRecord>>;

    /// Clear the soft-delete marker on tasks
    async fn restore_tasks(&self, owner: &str, ids: &[String]) -> RepoResult<Vec<TaskRecord>>;

    /// Deliver an assistant chat message to a thread
    async fn post_thread_message(
        &self,
        owner: &str,
        thread_id: &str,
        content: &str,
    ) -> RepoResult<ThreadMessage>;

    async fn get_project(&self, owner: &str, id: &str) -> RepoResult<ProjectRecord> {
        self.get_projects(owner)
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| RepoError::not_found("project", id))
    }

    /// Look up any entity by kind
    async fn get_entity(&self, owner: &str, kind: EntityKind, id: &str) -> RepoResult<EntityRecord> {
        match kind {
            EntityKind::Task => self.get_task(owner, id).await.map(EntityRecord::Task),
            EntityKind::Project => self.get_project(owner, id).await.map(EntityRecord::Project),
            EntityKind::Action => self
                .get_action_item(owner, id)
                .await
                .map(EntityRecord::Action),
        }
    }
}
