//! Undo engine
//!
//! Computes and performs the compensating action for an applied operation.
//! Destructive operations are reversed through the repository's soft-delete
//! restore calls. A missing identifier is an error, never a silent no-op.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::UndoError;
use crate::execution::{AppliedOperation, PriorState};
use crate::ops::{ActionState, LlmOperation, TaskStatus};
use crate::repository::{ActionStatePatch, WorkspaceRepository};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoOutcome {
    pub op: &'static str,
    /// Ids of the records the compensating action touched
    pub restored_ids: Vec<String>,
    pub message: String,
}

pub struct UndoEngine {
    repo: Arc<dyn WorkspaceRepository>,
}

impl UndoEngine {
    pub fn new(repo: Arc<dyn WorkspaceRepository>) -> Self {
        Self { repo }
    }

    pub async fn undo(
        &self,
        owner: &str,
        applied: &AppliedOperation,
    ) -> Result<UndoOutcome, UndoError> {
        self.undo_operation(owner, &applied.operation, applied.prior_state.as_ref())
            .await
    }

    pub async fn undo_operation(
        &self,
        owner: &str,
        op: &LlmOperation,
        prior: Option<&PriorState>,
    ) -> Result<UndoOutcome, UndoError> {
        let name = op.name();
        info!(op = name, owner, has_prior = prior.is_some(), "undoing operation");

        let (restored_ids, message) = match op {
            LlmOperation::Chat(_) => return Err(UndoError::NotUndoable { op: name }),

            LlmOperation::CreateTask(_) => {
                let task_id = match prior {
                    Some(PriorState::CreatedTask { task_id }) => task_id.clone(),
                    _ => {
                        return Err(UndoError::MissingIdentifier {
                            op: name,
                            field: "task_id",
                        })
                    }
                };
                let task = self.repo.archive_task(owner, &task_id).await?;
                (
                    vec![task.id],
                    format!("Archived task \"{}\"", task.title),
                )
            }

            LlmOperation::UpdateTaskStatus(params) => {
                let task_id = required(name, "task", &params.task)?;
                let previous = match prior {
                    Some(PriorState::TaskStatus {
                        previous_status, ..
                    }) => *previous_status,
                    _ => TaskStatus::default(),
                };
                self.repo
                    .update_task_status(owner, &task_id, previous)
                    .await?;
                (vec![task_id], format!("Task status restored to {}", previous))
            }

            LlmOperation::LinkActionToTask(params) => {
                let (action_id, task_id) = match prior {
                    Some(PriorState::ActionLink { action_id, task_id }) => {
                        (action_id.clone(), task_id.clone())
                    }
                    _ => (
                        required(name, "action", &params.action)?,
                        required(name, "task", &params.task)?,
                    ),
                };
                self.repo
                    .update_action_task_link(owner, &action_id, None)
                    .await?;
                self.repo
                    .remove_task_action_link(owner, &task_id, &action_id)
                    .await?;
                (
                    vec![action_id, task_id],
                    "Action item unlinked from task".to_string(),
                )
            }

            LlmOperation::UpdateActionState(params) => {
                let action_id = required(name, "action", &params.action)?;
                let patch = match prior {
                    Some(PriorState::ActionState {
                        previous_state,
                        previous_defer_until,
                        previous_added_to_today,
                        ..
                    }) => ActionStatePatch {
                        state: Some(*previous_state),
                        defer_until: Some(*previous_defer_until),
                        added_to_today: Some(*previous_added_to_today),
                    },
                    _ => ActionStatePatch {
                        state: Some(ActionState::default()),
                        defer_until: Some(None),
                        added_to_today: Some(None),
                    },
                };
                let action = self
                    .repo
                    .update_action_state(owner, &action_id, patch)
                    .await?;
                (
                    vec![action.id],
                    format!("Action item restored to {}", action.state),
                )
            }

            LlmOperation::DeleteProject(params) => {
                let (project_ids, cascaded) = match prior {
                    Some(PriorState::DeletedProjects {
                        project_ids,
                        cascaded_task_ids,
                    }) => (project_ids.clone(), cascaded_task_ids.clone()),
                    _ => (params.projects.clone(), Vec::new()),
                };
                if project_ids.is_empty() {
                    return Err(UndoError::MissingIdentifier {
                        op: name,
                        field: "projects",
                    });
                }
                let mut restored: Vec<String> = self
                    .repo
                    .restore_projects(owner, &project_ids)
                    .await?
                    .into_iter()
                    .map(|p| p.id)
                    .collect();
                if !cascaded.is_empty() {
                    restored.extend(
                        self.repo
                            .restore_tasks(owner, &cascaded)
                            .await?
                            .into_iter()
                            .map(|t| t.id),
                    );
                }
                let message = format!("Restored {} project(s)", project_ids.len());
                (restored, message)
            }

            LlmOperation::DeleteTask(params) => {
                let task_ids = match prior {
                    Some(PriorState::DeletedTasks { task_ids }) => task_ids.clone(),
                    _ => params.tasks.clone(),
                };
                if task_ids.is_empty() {
                    return Err(UndoError::MissingIdentifier {
                        op: name,
                        field: "tasks",
                    });
                }
                let restored: Vec<String> = self
                    .repo
                    .restore_tasks(owner, &task_ids)
                    .await?
                    .into_iter()
                    .map(|t| t.id)
                    .collect();
                let message = format!("Restored {} task(s)", restored.len());
                (restored, message)
            }
        };

        Ok(UndoOutcome {
            op: name,
            restored_ids,
            message,
        })
    }
}

fn required(op: &'static str, field: &'static str, value: &str) -> Result<String, UndoError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(UndoError::MissingIdentifier { op, field });
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{ExecutionContext, TrustGatedExecutor};
    use crate::ops::TrustMode;
    use crate::repository::InMemoryWorkspace;
    use serde_json::json;

    async fn setup() -> (Arc<InMemoryWorkspace>, TrustGatedExecutor, UndoEngine) {
        let repo = Arc::new(InMemoryWorkspace::new());
        repo.add_project("u1", "p-1", "Ops").await;
        repo.add_task("u1", "t-1", "Write docs", Some("p-1")).await;
        repo.add_task("u1", "t-2", "Ship release", None).await;
        repo.add_action_item("u1", "a-1", "Reply to Sam").await;
        (
            repo.clone(),
            TrustGatedExecutor::new(repo.clone()),
            UndoEngine::new(repo),
        )
    }

    async fn apply(exec: &TrustGatedExecutor, value: serde_json::Value) -> AppliedOperation {
        let op = LlmOperation::from_record(&value).unwrap();
        let mut result = exec
            .execute("u1", vec![op], TrustMode::Autonomous, &ExecutionContext::default())
            .await;
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        result.applied.remove(0)
    }

    #[tokio::test]
    async fn test_undo_create_archives_task() {
        let (repo, exec, undo) = setup().await;
        let applied = apply(&exec, json!({"op": "create_task", "params": {"title": "Temp"}})).await;
        undo.undo("u1", &applied).await.unwrap();
        let titles: Vec<String> = repo
            .get_tasks("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert!(!titles.contains(&"Temp".to_string()));
    }

    #[tokio::test]
    async fn test_undo_delete_project_restores_cascade() {
        let (repo, exec, undo) = setup().await;
        let applied = apply(&exec, json!({"op": "delete_project", "params": {"projects": ["p-1"]}})).await;
        assert!(repo.get_projects("u1").await.unwrap().is_empty());
        assert_eq!(repo.get_tasks("u1").await.unwrap().len(), 1);

        let outcome = undo.undo("u1", &applied).await.unwrap();
        assert_eq!(outcome.restored_ids, vec!["p-1".to_string(), "t-1".to_string()]);
        assert_eq!(repo.get_projects("u1").await.unwrap().len(), 1);
        assert_eq!(repo.get_tasks("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_undo_delete_task_without_prior_uses_params() {
        let (repo, exec, undo) = setup().await;
        let applied = apply(&exec, json!({"op": "delete_task", "params": {"tasks": ["t-2"]}})).await;
        undo.undo_operation("u1", &applied.operation, None).await.unwrap();
        assert!(repo.get_task("u1", "t-2").await.is_ok());
    }

    #[tokio::test]
    async fn test_undo_status_defaults_to_backlog() {
        let (repo, _, undo) = setup().await;
        repo.update_task_status("u1", "t-1", TaskStatus::Done).await.unwrap();
        let op = LlmOperation::from_record(&json!({
            "op": "update_task_status", "params": {"task": "t-1", "status": "done"}
        }))
        .unwrap();
        undo.undo_operation("u1", &op, None).await.unwrap();
        assert_eq!(repo.get_task("u1", "t-1").await.unwrap().status, TaskStatus::Backlog);
    }

    #[tokio::test]
    async fn test_undo_link_clears_both_sides() {
        let (repo, exec, undo) = setup().await;
        let applied = apply(
            &exec,
            json!({"op": "link_action_to_task", "params": {"action": "a-1", "task": "t-2"}}),
        )
        .await;
        undo.undo("u1", &applied).await.unwrap();
        assert_eq!(repo.get_action_item("u1", "a-1").await.unwrap().task_id, None);
        assert!(repo.get_task("u1", "t-2").await.unwrap().action_ids.is_empty());
    }

    #[tokio::test]
    async fn test_undo_action_state_restores_previous() {
        let (repo, exec, undo) = setup().await;
        let applied = apply(
            &exec,
            json!({"op": "update_action_state", "params": {"action": "a-1", "state": "dismissed", "added_to_today": true}}),
        )
        .await;
        undo.undo("u1", &applied).await.unwrap();
        let action = repo.get_action_item("u1", "a-1").await.unwrap();
        assert_eq!(action.state, ActionState::Queued);
        assert_eq!(action.added_to_today, None);
    }

    #[tokio::test]
    async fn test_chat_and_missing_ids_fail() {
        let (_, _, undo) = setup().await;
        let err = undo
            .undo_operation("u1", &LlmOperation::chat("hi"), None)
            .await
            .unwrap_err();
        assert_eq!(err, UndoError::NotUndoable { op: "chat" });

        let create = LlmOperation::from_record(&json!({"op": "create_task", "params": {"title": "X"}}))
            .unwrap();
        let err = undo.undo_operation("u1", &create, None).await.unwrap_err();
        assert!(matches!(err, UndoError::MissingIdentifier { field: "task_id", .. }));
    }
}
