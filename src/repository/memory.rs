//! In-memory workspace backend
//!
//! Honours the same contract a database backend would: ownership checks,
//! not-found and duplicate-name signalling, soft delete with restore, and
//! atomicity per call (every id is validated before anything is mutated).

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{
    ActionItemRecord, ActionStatePatch, DeletedProjects, NewTask, ProjectRecord, TaskRecord,
    ThreadMessage,
};
use super::WorkspaceRepository;
use crate::error::{RepoError, RepoResult};
use crate::ops::{ActionState, TaskStatus};

#[derive(Debug, Default)]
struct WorkspaceState {
    projects: BTreeMap<String, ProjectRecord>,
    tasks: BTreeMap<String, TaskRecord>,
    actions: BTreeMap<String, ActionItemRecord>,
    messages: Vec<ThreadMessage>,
}

impl WorkspaceState {
    fn task(&self, owner: &str, id: &str) -> RepoResult<&TaskRecord> {
        let task = self
            .tasks
            .get(id)
            .ok_or_else(|| RepoError::not_found("task", id))?;
        ensure_owner("task", &task.owner_id, owner, id)?;
        if task.deleted_at.is_some() {
            return Err(RepoError::not_found("task", id));
        }
        Ok(task)
    }

    /// Owned task regardless of deletion state
    fn any_task_mut(&mut self, owner: &str, id: &str) -> RepoResult<&mut TaskRecord> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| RepoError::not_found("task", id))?;
        ensure_owner("task", &task.owner_id, owner, id)?;
        Ok(task)
    }

    fn task_mut(&mut self, owner: &str, id: &str) -> RepoResult<&mut TaskRecord> {
        let task = self.any_task_mut(owner, id)?;
        if task.deleted_at.is_some() {
            return Err(RepoError::not_found("task", id));
        }
        Ok(task)
    }

    fn any_project_mut(&mut self, owner: &str, id: &str) -> RepoResult<&mut ProjectRecord> {
        let project = self
            .projects
            .get_mut(id)
            .ok_or_else(|| RepoError::not_found("project", id))?;
        ensure_owner("project", &project.owner_id, owner, id)?;
        Ok(project)
    }

    fn project_mut(&mut self, owner: &str, id: &str) -> RepoResult<&mut ProjectRecord> {
        let project = self.any_project_mut(owner, id)?;
        if project.deleted_at.is_some() {
            return Err(RepoError::not_found("project", id));
        }
        Ok(project)
    }

    fn action(&self, owner: &str, id: &str) -> RepoResult<&ActionItemRecord> {
        let action = self
            .actions
            .get(id)
            .ok_or_else(|| RepoError::not_found("action", id))?;
        ensure_owner("action", &action.owner_id, owner, id)?;
        Ok(action)
    }

    fn action_mut(&mut self, owner: &str, id: &str) -> RepoResult<&mut ActionItemRecord> {
        let action = self
            .actions
            .get_mut(id)
            .ok_or_else(|| RepoError::not_found("action", id))?;
        ensure_owner("action", &action.owner_id, owner, id)?;
        Ok(action)
    }
}

fn ensure_owner(entity: &str, owner_id: &str, owner: &str, id: &str) -> RepoResult<()> {
    if owner_id != owner {
        return Err(RepoError::Forbidden {
            entity: entity.into(),
            id: id.into(),
        });
    }
    Ok(())
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(id.clone());
        }
    }
    seen
}

/// In-memory implementation of `WorkspaceRepository`
#[derive(Debug, Default)]
pub struct InMemoryWorkspace {
    state: RwLock<WorkspaceState>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project with a fixed id
    pub async fn add_project(&self, owner: &str, id: &str, name: &str) -> ProjectRecord {
        let record = ProjectRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
            deleted_at: None,
        };
        self.state
            .write()
            .await
            .projects
            .insert(record.id.clone(), record.clone());
        record
    }

    /// Seed a task with a fixed id
    pub async fn add_task(
        &self,
        owner: &str,
        id: &str,
        title: &str,
        project_id: Option<&str>,
    ) -> TaskRecord {
        let record = TaskRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            title: title.to_string(),
            project_id: project_id.map(String::from),
            status: TaskStatus::Backlog,
            importance: None,
            description: None,
            from_action_id: None,
            action_ids: Vec::new(),
            archived: false,
            created_at: Utc::now(),
            deleted_at: None,
        };
        self.state
            .write()
            .await
            .tasks
            .insert(record.id.clone(), record.clone());
        record
    }

    /// Seed an action item with a fixed id
    pub async fn add_action_item(&self, owner: &str, id: &str, title: &str) -> ActionItemRecord {
        let record = ActionItemRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            title: title.to_string(),
            state: ActionState::Queued,
            defer_until: None,
            added_to_today: None,
            task_id: None,
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .actions
            .insert(record.id.clone(), record.clone());
        record
    }

    /// Raw task record, including soft-deleted ones
    pub async fn raw_task(&self, id: &str) -> Option<TaskRecord> {
        self.state.read().await.tasks.get(id).cloned()
    }

    /// Raw project record, including soft-deleted ones
    pub async fn raw_project(&self, id: &str) -> Option<ProjectRecord> {
        self.state.read().await.projects.get(id).cloned()
    }

    /// Messages delivered to a thread, oldest first
    pub async fn thread_messages(&self, thread_id: &str) -> Vec<ThreadMessage> {
        self.state
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl WorkspaceRepository for InMemoryWorkspace {
    async fn get_task(&self, owner: &str, id: &str) -> RepoResult<TaskRecord> {
        let state = self.state.read().await;
        state.task(owner, id).cloned()
    }

    async fn get_tasks(&self, owner: &str) -> RepoResult<Vec<TaskRecord>> {
        let state = self.state.read().await;
        let mut tasks: Vec<TaskRecord> = state
            .tasks
            .values()
            .filter(|t| t.owner_id == owner && t.is_active())
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn get_projects(&self, owner: &str) -> RepoResult<Vec<ProjectRecord>> {
        let state = self.state.read().await;
        let mut projects: Vec<ProjectRecord> = state
            .projects
            .values()
            .filter(|p| p.owner_id == owner && p.is_active())
            .cloned()
            .collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn get_action_item(&self, owner: &str, id: &str) -> RepoResult<ActionItemRecord> {
        let state = self.state.read().await;
        state.action(owner, id).cloned()
    }

    async fn get_action_items(&self, owner: &str) -> RepoResult<Vec<ActionItemRecord>> {
        let state = self.state.read().await;
        let mut actions: Vec<ActionItemRecord> = state
            .actions
            .values()
            .filter(|a| a.owner_id == owner)
            .cloned()
            .collect();
        actions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(actions)
    }

    async fn create_task(&self, owner: &str, task: NewTask) -> RepoResult<TaskRecord> {
        let mut state = self.state.write().await;

        let title = task.title.trim().to_string();
        if title.is_empty() {
            return Err(RepoError::Invalid("task title must not be empty".into()));
        }
        let duplicate = state
            .tasks
            .values()
            .any(|t| t.owner_id == owner && t.is_active() && t.title.eq_ignore_ascii_case(&title));
        if duplicate {
            return Err(RepoError::DuplicateName {
                entity: "task".into(),
                name: title,
            });
        }
        if let Some(project_id) = &task.project_id {
            state.project_mut(owner, project_id)?;
        }
        if let Some(action_id) = &task.from_action_id {
            state.action_mut(owner, action_id)?;
        }

        let record = TaskRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.to_string(),
            title,
            project_id: task.project_id,
            status: TaskStatus::Backlog,
            importance: task.importance,
            description: task.description,
            from_action_id: task.from_action_id.clone(),
            action_ids: task.from_action_id.iter().cloned().collect(),
            archived: false,
            created_at: Utc::now(),
            deleted_at: None,
        };

        if let Some(action_id) = &task.from_action_id {
            let action = state.action_mut(owner, action_id)?;
            action.task_id = Some(record.id.clone());
            action.state = ActionState::ConvertedToTask;
        }
        state.tasks.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_task_status(
        &self,
        owner: &str,
        id: &str,
        status: TaskStatus,
    ) -> RepoResult<TaskRecord> {
        let mut state = self.state.write().await;
        let task = state.task_mut(owner, id)?;
        task.status = status;
        Ok(task.clone())
    }

    async fn update_action_task_link(
        &self,
        owner: &str,
        action_id: &str,
        task_id: Option<&str>,
    ) -> RepoResult<ActionItemRecord> {
        let mut state = self.state.write().await;
        if let Some(task_id) = task_id {
            state.task_mut(owner, task_id)?;
        }
        let action = state.action_mut(owner, action_id)?;
        action.task_id = task_id.map(String::from);
        Ok(action.clone())
    }

    async fn create_task_action_link(
        &self,
        owner: &str,
        task_id: &str,
        action_id: &str,
    ) -> RepoResult<TaskRecord> {
        let mut state = self.state.write().await;
        state.action_mut(owner, action_id)?;
        let task = state.task_mut(owner, task_id)?;
        if !task.action_ids.iter().any(|a| a == action_id) {
            task.action_ids.push(action_id.to_string());
        }
        Ok(task.clone())
    }

    async fn remove_task_action_link(
        &self,
        owner: &str,
        task_id: &str,
        action_id: &str,
    ) -> RepoResult<TaskRecord> {
        let mut state = self.state.write().await;
        let task = state.any_task_mut(owner, task_id)?;
        task.action_ids.retain(|a| a != action_id);
        Ok(task.clone())
    }

    async fn update_action_state(
        &self,
        owner: &str,
        id: &str,
        patch: ActionStatePatch,
    ) -> RepoResult<ActionItemRecord> {
        let mut state = self.state.write().await;
        let action = state.action_mut(owner, id)?;
        if let Some(new_state) = patch.state {
            action.state = new_state;
        }
        if let Some(defer_until) = patch.defer_until {
            action.defer_until = defer_until;
        }
        if let Some(added_to_today) = patch.added_to_today {
            action.added_to_today = added_to_today;
        }
        Ok(action.clone())
    }

    async fn delete_projects(&self, owner: &str, ids: &[String]) -> RepoResult<DeletedProjects> {
        let ids = dedup(ids);
        let mut state = self.state.write().await;
        for id in &ids {
            state.project_mut(owner, id)?;
        }

        let now = Utc::now();
        let mut deleted = DeletedProjects::default();
        for id in &ids {
            let project = state.project_mut(owner, id)?;
            project.deleted_at = Some(now);
            deleted.projects.push(project.clone());
        }
        for task in state.tasks.values_mut() {
            let in_deleted_project = task
                .project_id
                .as_ref()
                .is_some_and(|p| ids.contains(p));
            if task.owner_id == owner && task.deleted_at.is_none() && in_deleted_project {
                task.deleted_at = Some(now);
                deleted.cascaded_tasks.push(task.clone());
            }
        }
        Ok(deleted)
    }

    async fn delete_tasks(&self, owner: &str, ids: &[String]) -> RepoResult<Vec<TaskRecord>> {
        let ids = dedup(ids);
        let mut state = self.state.write().await;
        for id in &ids {
            state.task_mut(owner, id)?;
        }

        let now = Utc::now();
        let mut deleted = Vec::with_capacity(ids.len());
        for id in &ids {
            let task = state.task_mut(owner, id)?;
            task.deleted_at = Some(now);
            deleted.push(task.clone());
        }
        Ok(deleted)
    }

    async fn archive_task(&self, owner: &str, id: &str) -> RepoResult<TaskRecord> {
        let mut state = self.state.write().await;
        let task = state.task_mut(owner, id)?;
        task.archived = true;
        Ok(task.clone())
    }

    async fn restore_projects(&self, owner: &str, ids: &[String]) -> RepoResult<Vec<ProjectRecord>> {
        let ids = dedup(ids);
        let mut state = self.state.write().await;
        for id in &ids {
            state.any_project_mut(owner, id)?;
        }
        let mut restored = Vec::with_capacity(ids.len());
        for id in &ids {
            let project = state.any_project_mut(owner, id)?;
            project.deleted_at = None;
            restored.push(project.clone());
        }
        Ok(restored)
    }

    async fn restore_tasks(&self, owner: &str, ids: &[String]) -> RepoResult<Vec<TaskRecord>> {
        let ids = dedup(ids);
        let mut state = self.state.write().await;
        for id in &ids {
            state.any_task_mut(owner, id)?;
        }
        let mut restored = Vec::with_capacity(ids.len());
        for id in &ids {
            let task = state.any_task_mut(owner, id)?;
            task.deleted_at = None;
            restored.push(task.clone());
        }
        Ok(restored)
    }

    async fn post_thread_message(
        &self,
        owner: &str,
        thread_id: &str,
        content: &str,
    ) -> RepoResult<ThreadMessage> {
        let message = ThreadMessage {
            id: Uuid::new_v4().to_string(),
            thread_id: thread_id.to_string(),
            owner_id: owner.to_string(),
            role: "assistant".to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.state.write().await.messages.push(message.clone());
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_title_conflict() {
        let ws = InMemoryWorkspace::new();
        ws.add_task("u1", "t-1", "Write docs", None).await;

        let err = ws
            .create_task(
                "u1",
                NewTask {
                    title: "write DOCS".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::DuplicateName { .. }));

        // another owner may reuse the title
        assert!(ws
            .create_task(
                "u2",
                NewTask {
                    title: "Write docs".into(),
                    ..Default::default()
                },
            )
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_ownership_enforced() {
        let ws = InMemoryWorkspace::new();
        ws.add_task("u1", "t-1", "Mine", None).await;
        let err = ws.get_task("u2", "t-1").await.unwrap_err();
        assert!(matches!(err, RepoError::Forbidden { .. }));
        let err = ws.get_task("u1", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_project_delete_cascades_and_restores() {
        let ws = InMemoryWorkspace::new();
        ws.add_project("u1", "p-1", "Ops").await;
        ws.add_task("u1", "t-1", "A", Some("p-1")).await;
        ws.add_task("u1", "t-2", "B", None).await;

        let deleted = ws.delete_projects("u1", &["p-1".to_string()]).await.unwrap();
        assert_eq!(deleted.projects.len(), 1);
        assert_eq!(deleted.cascaded_tasks.len(), 1);
        assert_eq!(deleted.cascaded_tasks[0].id, "t-1");
        assert!(ws.get_projects("u1").await.unwrap().is_empty());
        assert_eq!(ws.get_tasks("u1").await.unwrap().len(), 1);

        // soft delete: the records stay, marked
        assert!(ws.raw_project("p-1").await.unwrap().deleted_at.is_some());
        assert!(ws.raw_task("t-1").await.unwrap().deleted_at.is_some());
        assert!(ws.get_task("u1", "t-1").await.unwrap_err().is_not_found());

        ws.restore_projects("u1", &["p-1".to_string()]).await.unwrap();
        ws.restore_tasks("u1", &["t-1".to_string()]).await.unwrap();
        assert_eq!(ws.get_projects("u1").await.unwrap().len(), 1);
        assert_eq!(ws.get_tasks("u1").await.unwrap().len(), 2);
        assert_eq!(ws.raw_task("t-1").await.unwrap().deleted_at, None);
    }

    #[tokio::test]
    async fn test_reads_check_ownership() {
        let ws = InMemoryWorkspace::new();
        ws.add_task("u1", "t-1", "A", None).await;
        ws.add_action_item("u1", "a-1", "Reply").await;
        assert!(matches!(
            ws.get_task("u2", "t-1").await.unwrap_err(),
            RepoError::Forbidden { .. }
        ));
        assert!(matches!(
            ws.get_action_item("u2", "a-1").await.unwrap_err(),
            RepoError::Forbidden { .. }
        ));
        assert!(ws.get_action_item("u1", "a-404").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_all_or_nothing() {
        let ws = InMemoryWorkspace::new();
        ws.add_task("u1", "t-1", "A", None).await;
        let err = ws
            .delete_tasks("u1", &["t-1".to_string(), "nope".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ws.get_tasks("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_archive_hides_from_listing() {
        let ws = InMemoryWorkspace::new();
        ws.add_task("u1", "t-1", "A", None).await;
        ws.archive_task("u1", "t-1").await.unwrap();
        assert!(ws.get_tasks("u1").await.unwrap().is_empty());
        assert!(ws.get_task("u1", "t-1").await.unwrap().archived);
    }

    #[tokio::test]
    async fn test_create_from_action_converts_it() {
        let ws = InMemoryWorkspace::new();
        ws.add_action_item("u1", "a-1", "Reply to Sam").await;
        let task = ws
            .create_task(
                "u1",
                NewTask {
                    title: "Reply to Sam".into(),
                    from_action_id: Some("a-1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let action = ws.get_action_item("u1", "a-1").await.unwrap();
        assert_eq!(action.state, ActionState::ConvertedToTask);
        assert_eq!(action.task_id.as_deref(), Some(task.id.as_str()));
        assert_eq!(task.action_ids, vec!["a-1".to_string()]);
    }
}
