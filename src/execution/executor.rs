//! Trust-gated executor
//!
//! Each operation is classified by risk; the caller's trust mode decides
//! whether it is applied now or left pending for explicit approval. Applied
//! operations have their semantic references resolved to ids first. A
//! failure is isolated to its own entry in `errors` and, when a thread is
//! attached, explained to the user with a fallback chat message.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::fallback::{duplicate_name_message, fallback_message};
use super::result::{ApprovalOutcome, AppliedOperation, ExecutionResult, FailedOperation, PriorState};
use crate::error::{ExecError, ResolveError};
use crate::ops::{
    CreateTaskParams, DeleteProjectParams, DeleteTaskParams, LinkActionToTaskParams,
    LlmOperation, TrustMode, UpdateActionStateParams, UpdateTaskStatusParams,
};
use crate::repository::{ActionStatePatch, NewTask, WorkspaceRepository};
use crate::semantic::{ContextSnapshot, ResolveFocus, SemanticResolver};

/// Per-call execution inputs
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Thread that receives chat and fallback messages
    pub thread_id: Option<String>,
    /// Already-loaded records; `None` makes the resolver load from the repository
    pub snapshot: Option<ContextSnapshot>,
    pub focus: ResolveFocus,
}

impl ExecutionContext {
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Default::default()
        }
    }

    pub fn with_focus(mut self, focus: ResolveFocus) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_snapshot(mut self, snapshot: ContextSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

pub struct TrustGatedExecutor {
    repo: Arc<dyn WorkspaceRepository>,
    resolver: SemanticResolver,
    fallback_messages: bool,
}

impl TrustGatedExecutor {
    pub fn new(repo: Arc<dyn WorkspaceRepository>) -> Self {
        Self {
            resolver: SemanticResolver::new(repo.clone()),
            repo,
            fallback_messages: true,
        }
    }

    /// Enable or disable fallback chat messages on failure
    pub fn with_fallback_messages(mut self, enabled: bool) -> Self {
        self.fallback_messages = enabled;
        self
    }

    /// Apply what `trust` allows, leave the rest pending
    pub async fn execute(
        &self,
        owner: &str,
        operations: Vec<LlmOperation>,
        trust: TrustMode,
        ctx: &ExecutionContext,
    ) -> ExecutionResult {
        let mut result = ExecutionResult::default();

        for op in operations {
            let risk = op.risk();
            if !trust.auto_applies(risk) {
                debug!(op = op.name(), ?risk, trust = %trust, "operation left pending");
                result.pending.push(op);
                continue;
            }

            match self.apply(owner, &op, ctx).await {
                Ok(applied) => {
                    info!(op = op.name(), owner, "operation applied");
                    result.applied.push(applied);
                }
                Err(e) => {
                    warn!(op = op.name(), owner, error = %e, "operation failed");
                    let fallback = self.fallback_chat(owner, &op, &e, ctx).await;
                    result.errors.push(FailedOperation {
                        operation: op,
                        error: e.to_string(),
                    });
                    if let Some(chat) = fallback {
                        result.applied.push(chat);
                    }
                }
            }
        }

        result
    }

    /// Run one operation the user explicitly approved, bypassing the trust gate
    pub async fn execute_approved(
        &self,
        owner: &str,
        op: &LlmOperation,
        ctx: &ExecutionContext,
    ) -> ApprovalOutcome {
        match self.apply(owner, op, ctx).await {
            Ok(applied) => {
                info!(op = op.name(), owner, "approved operation applied");
                ApprovalOutcome::Applied(applied)
            }
            Err(ExecError::DuplicateName { entity, name }) => {
                info!(op = op.name(), %entity, %name, "approved operation hit a name conflict");
                ApprovalOutcome::Conflict {
                    message: duplicate_name_message(&entity),
                }
            }
            Err(e) => {
                warn!(op = op.name(), owner, error = %e, "approved operation failed");
                ApprovalOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Post a fallback message; its own failure is logged and dropped
    async fn fallback_chat(
        &self,
        owner: &str,
        op: &LlmOperation,
        err: &ExecError,
        ctx: &ExecutionContext,
    ) -> Option<AppliedOperation> {
        if !self.fallback_messages {
            return None;
        }
        let thread_id = ctx.thread_id.as_deref()?;
        let message = fallback_message(op, err);
        match self.repo.post_thread_message(owner, thread_id, &message).await {
            Ok(_) => Some(AppliedOperation::new(LlmOperation::chat(message), None)),
            Err(e) => {
                warn!(thread_id, error = %e, "fallback message could not be delivered");
                None
            }
        }
    }

    async fn apply(
        &self,
        owner: &str,
        op: &LlmOperation,
        ctx: &ExecutionContext,
    ) -> Result<AppliedOperation, ExecError> {
        match op {
            LlmOperation::Chat(params) => {
                if let Some(thread_id) = ctx.thread_id.as_deref() {
                    self.repo
                        .post_thread_message(owner, thread_id, &params.message)
                        .await?;
                }
                Ok(AppliedOperation::new(op.clone(), None))
            }
            LlmOperation::CreateTask(params) => self.create_task(owner, params, ctx).await,
            LlmOperation::UpdateTaskStatus(params) => {
                self.update_task_status(owner, params, ctx).await
            }
            LlmOperation::LinkActionToTask(params) => self.link(owner, params, ctx).await,
            LlmOperation::UpdateActionState(params) => {
                self.update_action_state(owner, params, ctx).await
            }
            LlmOperation::DeleteProject(params) => self.delete_projects(owner, params, ctx).await,
            LlmOperation::DeleteTask(params) => self.delete_tasks(owner, params, ctx).await,
        }
    }

    async fn create_task(
        &self,
        owner: &str,
        params: &CreateTaskParams,
        ctx: &ExecutionContext,
    ) -> Result<AppliedOperation, ExecError> {
        let project_id = match params.project.as_deref() {
            None => None,
            Some(term) => {
                let found = self
                    .resolver
                    .resolve_project(owner, term, ctx.snapshot.as_ref(), &ctx.focus)
                    .await?;
                // an unresolved project alias means "no project"; anything else is an error
                if found.is_none() && !SemanticResolver::is_project_alias(term) {
                    return Err(ResolveError::NotFound {
                        kind: "project",
                        term: term.to_string(),
                        suggestion: None,
                    }
                    .into());
                }
                found
            }
        };
        let from_action_id = match params.from_action.as_deref() {
            None => None,
            Some(term) => Some(
                self.resolver
                    .resolve_action(owner, term, ctx.snapshot.as_ref(), &ctx.focus)
                    .await?,
            ),
        };

        let task = self
            .repo
            .create_task(
                owner,
                NewTask {
                    title: params.title.clone(),
                    project_id: project_id.clone(),
                    importance: params.priority,
                    description: params.description.clone(),
                    from_action_id: from_action_id.clone(),
                },
            )
            .await?;

        let resolved = LlmOperation::CreateTask(CreateTaskParams {
            project: project_id,
            from_action: from_action_id,
            ..params.clone()
        });
        Ok(AppliedOperation::new(
            resolved,
            Some(PriorState::CreatedTask { task_id: task.id }),
        ))
    }

    async fn update_task_status(
        &self,
        owner: &str,
        params: &UpdateTaskStatusParams,
        ctx: &ExecutionContext,
    ) -> Result<AppliedOperation, ExecError> {
        let task_id = self
            .resolver
            .resolve_task(owner, &params.task, ctx.snapshot.as_ref(), &ctx.focus)
            .await?;
        let before = self.repo.get_task(owner, &task_id).await?;
        self.repo
            .update_task_status(owner, &task_id, params.status)
            .await?;

        Ok(AppliedOperation::new(
            LlmOperation::UpdateTaskStatus(UpdateTaskStatusParams {
                task: task_id.clone(),
                status: params.status,
            }),
            Some(PriorState::TaskStatus {
                task_id,
                previous_status: before.status,
            }),
        ))
    }

    /// Two writes: the action's primary pointer, then the join relation.
    /// A failure in the second leaves the first in place.
    async fn link(
        &self,
        owner: &str,
        params: &LinkActionToTaskParams,
        ctx: &ExecutionContext,
    ) -> Result<AppliedOperation, ExecError> {
        let action_id = self
            .resolver
            .resolve_action(owner, &params.action, ctx.snapshot.as_ref(), &ctx.focus)
            .await?;
        let task_id = self
            .resolver
            .resolve_task(owner, &params.task, ctx.snapshot.as_ref(), &ctx.focus)
            .await?;

        self.repo
            .update_action_task_link(owner, &action_id, Some(&task_id))
            .await?;
        if let Err(e) = self
            .repo
            .create_task_action_link(owner, &task_id, &action_id)
            .await
        {
            warn!(%action_id, %task_id, error = %e, "join link failed after primary pointer update");
            return Err(e.into());
        }

        Ok(AppliedOperation::new(
            LlmOperation::LinkActionToTask(LinkActionToTaskParams {
                action: action_id.clone(),
                task: task_id.clone(),
            }),
            Some(PriorState::ActionLink { action_id, task_id }),
        ))
    }

    async fn update_action_state(
        &self,
        owner: &str,
        params: &UpdateActionStateParams,
        ctx: &ExecutionContext,
    ) -> Result<AppliedOperation, ExecError> {
        let action_id = self
            .resolver
            .resolve_action(owner, &params.action, ctx.snapshot.as_ref(), &ctx.focus)
            .await?;
        let before = self.repo.get_action_item(owner, &action_id).await?;
        let patch = ActionStatePatch {
            state: params.state,
            defer_until: params.defer_until.map(Some),
            added_to_today: params.added_to_today.map(Some),
        };
        self.repo
            .update_action_state(owner, &action_id, patch)
            .await?;

        Ok(AppliedOperation::new(
            LlmOperation::UpdateActionState(UpdateActionStateParams {
                action: action_id.clone(),
                ..params.clone()
            }),
            Some(PriorState::ActionState {
                action_id,
                previous_state: before.state,
                previous_defer_until: before.defer_until,
                previous_added_to_today: before.added_to_today,
            }),
        ))
    }

    async fn delete_projects(
        &self,
        owner: &str,
        params: &DeleteProjectParams,
        ctx: &ExecutionContext,
    ) -> Result<AppliedOperation, ExecError> {
        let mut ids = Vec::with_capacity(params.projects.len());
        for term in &params.projects {
            let id = self
                .resolver
                .resolve_project(owner, term, ctx.snapshot.as_ref(), &ctx.focus)
                .await?
                .ok_or_else(|| ResolveError::NotFound {
                    kind: "project",
                    term: term.clone(),
                    suggestion: None,
                })?;
            ids.push(id);
        }

        let deleted = self.repo.delete_projects(owner, &ids).await?;
        Ok(AppliedOperation::new(
            LlmOperation::DeleteProject(DeleteProjectParams {
                projects: ids.clone(),
            }),
            Some(PriorState::DeletedProjects {
                project_ids: deleted.projects.into_iter().map(|p| p.id).collect(),
                cascaded_task_ids: deleted.cascaded_tasks.into_iter().map(|t| t.id).collect(),
            }),
        ))
    }

    async fn delete_tasks(
        &self,
        owner: &str,
        params: &DeleteTaskParams,
        ctx: &ExecutionContext,
    ) -> Result<AppliedOperation, ExecError> {
        let mut ids = Vec::with_capacity(params.tasks.len());
        for term in &params.tasks {
            ids.push(
                self.resolver
                    .resolve_task(owner, term, ctx.snapshot.as_ref(), &ctx.focus)
                    .await?,
            );
        }

        let deleted = self.repo.delete_tasks(owner, &ids).await?;
        Ok(AppliedOperation::new(
            LlmOperation::DeleteTask(DeleteTaskParams { tasks: ids }),
            Some(PriorState::DeletedTasks {
                task_ids: deleted.into_iter().map(|t| t.id).collect(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RepoError, RepoResult};
    use crate::ops::{ActionState, Priority, TaskStatus};
    use crate::repository::{
        ActionItemRecord, DeletedProjects, InMemoryWorkspace, ProjectRecord, TaskRecord,
        ThreadMessage,
    };
    use async_trait::async_trait;
    use serde_json::json;

    /// In-memory workspace whose join-link write always fails
    struct BrokenJoinWorkspace(Arc<InMemoryWorkspace>);

    #[async_trait]
    impl WorkspaceRepository for BrokenJoinWorkspace {
        async fn get_task(&self, owner: &str, id: &str) -> RepoResult<TaskRecord> {
            self.0.get_task(owner, id).await
        }
        async fn get_tasks(&self, owner: &str) -> RepoResult<Vec<TaskRecord>> {
            self.0.get_tasks(owner).await
        }
        async fn get_projects(&self, owner: &str) -> RepoResult<Vec<ProjectRecord>> {
            self.0.get_projects(owner).await
        }
        async fn get_action_item(&self, owner: &str, id: &str) -> RepoResult<ActionItemRecord> {
            self.0.get_action_item(owner, id).await
        }
        async fn get_action_items(&self, owner: &str) -> RepoResult<Vec<ActionItemRecord>> {
            self.0.get_action_items(owner).await
        }
        async fn create_task(&self, owner: &str, task: NewTask) -> RepoResult<TaskRecord> {
            self.0.create_task(owner, task).await
        }
        async fn update_task_status(
            &self,
            owner: &str,
            id: &str,
            status: TaskStatus,
        ) -> RepoResult<TaskRecord> {
            self.0.update_task_status(owner, id, status).await
        }
        async fn update_action_task_link(
            &self,
            owner: &str,
            action_id: &str,
            task_id: Option<&str>,
        ) -> RepoResult<ActionItemRecord> {
            self.0.update_action_task_link(owner, action_id, task_id).await
        }
        async fn create_task_action_link(
            &self,
            _owner: &str,
            _task_id: &str,
            _action_id: &str,
        ) -> RepoResult<TaskRecord> {
            Err(RepoError::Backend("join table unavailable".into()))
        }
        async fn remove_task_action_link(
            &self,
            owner: &str,
            task_id: &str,
            action_id: &str,
        ) -> RepoResult<TaskRecord> {
            self.0.remove_task_action_link(owner, task_id, action_id).await
        }
        async fn update_action_state(
            &self,
            owner: &str,
            id: &str,
            patch: ActionStatePatch,
        ) -> RepoResult<ActionItemRecord> {
            self.0.update_action_state(owner, id, patch).await
        }
        async fn delete_projects(&self, owner: &str, ids: &[String]) -> RepoResult<DeletedProjects> {
            self.0.delete_projects(owner, ids).await
        }
        async fn delete_tasks(&self, owner: &str, ids: &[String]) -> RepoResult<Vec<TaskRecord>> {
            self.0.delete_tasks(owner, ids).await
        }
        async fn archive_task(&self, owner: &str, id: &str) -> RepoResult<TaskRecord> {
            self.0.archive_task(owner, id).await
        }
        async fn restore_projects(&self, owner: &str, ids: &[String]) -> RepoResult<Vec<ProjectRecord>> {
            self.0.restore_projects(owner, ids).await
        }
        async fn restore_tasks(&self, owner: &str, ids: &[String]) -> RepoResult<Vec<TaskRecord>> {
            self.0.restore_tasks(owner, ids).await
        }
        async fn post_thread_message(
            &self,
            owner: &str,
            thread_id: &str,
            content: &str,
        ) -> RepoResult<ThreadMessage> {
            self.0.post_thread_message(owner, thread_id, content).await
        }
    }

    async fn setup() -> (Arc<InMemoryWorkspace>, TrustGatedExecutor) {
        let repo = Arc::new(InMemoryWorkspace::new());
        repo.add_project("u1", "p-1", "Ops").await;
        repo.add_task("u1", "t-1", "Write docs", Some("p-1")).await;
        repo.add_task("u1", "t-2", "Ship release", None).await;
        repo.add_action_item("u1", "a-1", "Reply to Sam").await;
        let executor = TrustGatedExecutor::new(repo.clone());
        (repo, executor)
    }

    fn op(value: serde_json::Value) -> LlmOperation {
        LlmOperation::from_record(&value).unwrap()
    }

    #[tokio::test]
    async fn test_training_wheels_leaves_create_pending() {
        let (repo, exec) = setup().await;
        let create = op(json!({"op": "create_task", "params": {"title": "X"}}));
        let result = exec
            .execute("u1", vec![create.clone()], TrustMode::TrainingWheels, &ExecutionContext::default())
            .await;
        assert!(result.applied.is_empty());
        assert_eq!(result.pending, vec![create]);
        assert!(result.errors.is_empty());
        assert_eq!(repo.get_tasks("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_supervised_applies_medium_and_holds_deletes() {
        let (repo, exec) = setup().await;
        let ops = vec![
            op(json!({"op": "update_task_status", "params": {"task": "Write docs", "status": "doing"}})),
            op(json!({"op": "delete_task", "params": {"tasks": ["t-2"]}})),
        ];
        let result = exec
            .execute("u1", ops, TrustMode::Supervised, &ExecutionContext::default())
            .await;
        assert_eq!(result.applied_names(), vec!["update_task_status"]);
        assert_eq!(result.pending.len(), 1);
        assert_eq!(result.pending[0].name(), "delete_task");

        assert_eq!(repo.get_task("u1", "t-1").await.unwrap().status, TaskStatus::Doing);
        assert_eq!(
            result.applied[0].prior_state,
            Some(PriorState::TaskStatus {
                task_id: "t-1".into(),
                previous_status: TaskStatus::Backlog,
            })
        );
        // name resolved to id in the applied entry
        assert_eq!(result.applied[0].operation.params_json()["task"], "t-1");
    }

    #[tokio::test]
    async fn test_create_task_resolves_project_name() {
        let (repo, exec) = setup().await;
        let create = op(json!({"op": "create_task", "params": {
            "title": "Plan sprint", "project": "ops", "priority": "high"
        }}));
        let result = exec
            .execute("u1", vec![create], TrustMode::Supervised, &ExecutionContext::default())
            .await;
        let Some(PriorState::CreatedTask { task_id }) = &result.applied[0].prior_state else {
            panic!("expected created task prior state");
        };
        let task = repo.get_task("u1", task_id).await.unwrap();
        assert_eq!(task.project_id.as_deref(), Some("p-1"));
        assert_eq!(task.importance, Some(Priority::High));
    }

    #[tokio::test]
    async fn test_unfocused_alias_creates_without_project() {
        let (repo, exec) = setup().await;
        let create = op(json!({"op": "create_task", "params": {
            "title": "Loose end", "project": "current project"
        }}));
        let result = exec
            .execute("u1", vec![create], TrustMode::Supervised, &ExecutionContext::default())
            .await;
        assert!(result.errors.is_empty());
        let task = repo
            .get_tasks("u1")
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.title == "Loose end")
            .unwrap();
        assert_eq!(task.project_id, None);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_with_fallback_chat() {
        let (repo, exec) = setup().await;
        let ops = vec![
            op(json!({"op": "create_task", "params": {"title": "write docs"}})),
            op(json!({"op": "update_task_status", "params": {"task": "t-2", "status": "done"}})),
        ];
        let ctx = ExecutionContext::for_thread("th-1");
        let result = exec.execute("u1", ops, TrustMode::Supervised, &ctx).await;

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].operation.name(), "create_task");
        assert_eq!(result.applied_names(), vec!["chat", "update_task_status"]);

        let messages = repo.thread_messages("th-1").await;
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].content,
            "That task already exists. Would you like to name it something else?"
        );
    }

    #[tokio::test]
    async fn test_no_fallback_without_thread() {
        let (_, exec) = setup().await;
        let ops = vec![op(json!({"op": "update_task_status", "params": {"task": "Nope", "status": "done"}}))];
        let result = exec
            .execute("u1", ops, TrustMode::Supervised, &ExecutionContext::default())
            .await;
        assert_eq!(result.errors.len(), 1);
        assert!(result.applied.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_can_be_disabled() {
        let (repo, exec) = setup().await;
        let exec = exec.with_fallback_messages(false);
        let ops = vec![op(json!({"op": "update_task_status", "params": {"task": "Nope", "status": "done"}}))];
        let result = exec
            .execute("u1", ops, TrustMode::Supervised, &ExecutionContext::for_thread("th-1"))
            .await;
        assert!(result.applied.is_empty());
        assert!(repo.thread_messages("th-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_approved_duplicate_is_conflict() {
        let (_, exec) = setup().await;
        let create = op(json!({"op": "create_task", "params": {"title": "Write Docs"}}));
        let outcome = exec
            .execute_approved("u1", &create, &ExecutionContext::default())
            .await;
        assert_eq!(
            outcome,
            ApprovalOutcome::Conflict {
                message: "That task already exists. Would you like to name it something else?"
                    .into()
            }
        );
    }

    #[tokio::test]
    async fn test_approved_delete_bypasses_gate() {
        let (repo, exec) = setup().await;
        let delete = op(json!({"op": "delete_project", "params": {"projects": ["Ops"]}}));
        let outcome = exec
            .execute_approved("u1", &delete, &ExecutionContext::default())
            .await;
        let ApprovalOutcome::Applied(applied) = outcome else {
            panic!("expected applied");
        };
        assert_eq!(
            applied.prior_state,
            Some(PriorState::DeletedProjects {
                project_ids: vec!["p-1".into()],
                cascaded_task_ids: vec!["t-1".into()],
            })
        );
        assert!(repo.get_projects("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_link_and_action_state() {
        let (repo, exec) = setup().await;
        let ctx = ExecutionContext::default().with_focus(ResolveFocus {
            task_id: Some("t-2".into()),
            action_id: Some("a-1".into()),
        });
        let ops = vec![
            op(json!({"op": "link_action_to_task", "params": {"action": "this action", "task": "this task"}})),
            op(json!({"op": "update_action_state", "params": {"action": "a-1", "state": "deferred", "defer_until": "2026-11-02"}})),
        ];
        let result = exec.execute("u1", ops, TrustMode::Supervised, &ctx).await;
        assert!(result.errors.is_empty(), "{:?}", result.errors);

        let action = repo.get_action_item("u1", "a-1").await.unwrap();
        assert_eq!(action.task_id.as_deref(), Some("t-2"));
        assert_eq!(action.state, ActionState::Deferred);
        assert!(action.defer_until.is_some());
        assert!(repo
            .get_task("u1", "t-2")
            .await
            .unwrap()
            .action_ids
            .contains(&"a-1".to_string()));
    }

    #[tokio::test]
    async fn test_task_alias_is_not_a_project() {
        let (repo, exec) = setup().await;
        let ctx = ExecutionContext::default().with_focus(ResolveFocus::task("t-1"));
        let create = op(json!({"op": "create_task", "params": {"title": "New", "project": "this task"}}));
        let result = exec.execute("u1", vec![create], TrustMode::Supervised, &ctx).await;

        assert!(result.applied.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].error.contains("this task"), "{}", result.errors[0].error);
        assert_eq!(repo.get_tasks("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_join_keeps_primary_pointer() {
        let (repo, _) = setup().await;
        let exec = TrustGatedExecutor::new(Arc::new(BrokenJoinWorkspace(repo.clone())));
        let link = op(json!({"op": "link_action_to_task", "params": {"action": "a-1", "task": "t-2"}}));
        let result = exec
            .execute("u1", vec![link], TrustMode::Supervised, &ExecutionContext::default())
            .await;

        assert!(result.applied.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].operation.name(), "link_action_to_task");
        assert!(result.errors[0].error.contains("join table unavailable"));

        // no rollback of the first write
        let action = repo.get_action_item("u1", "a-1").await.unwrap();
        assert_eq!(action.task_id.as_deref(), Some("t-2"));
        assert!(repo.get_task("u1", "t-2").await.unwrap().action_ids.is_empty());
    }
}
