//! End-to-end protocol scenarios

use serde_json::json;
use std::sync::Arc;

use workroom_ops::ops::TaskStatus;
use workroom_ops::{
    parse_message, ContextSnapshot, ExecutionContext, InMemoryWorkspace, LlmOperation,
    ResolveError, ResolveFocus, SemanticResolver, TrustGatedExecutor, TrustMode, UndoEngine,
    WorkspaceRepository,
};

const OWNER: &str = "user-1";

async fn workspace() -> Arc<InMemoryWorkspace> {
    let repo = Arc::new(InMemoryWorkspace::new());
    repo.add_project(OWNER, "project-ops", "Ops").await;
    repo.add_task(OWNER, "task-1", "Sample", Some("project-ops")).await;
    repo.add_task(OWNER, "task-2", "Write docs", None).await;
    repo.add_action_item(OWNER, "action-1", "Reply to vendor").await;
    repo
}

#[test]
fn test_reference_token_becomes_placeholder() {
    let parsed =
        parse_message(r#"Link this [ref v:1 type:"task" id:task-1 name:"Sample"] please."#)
            .unwrap();
    assert_eq!(parsed.llm_text, "Link this <<REF_1>> please.");
    assert_eq!(parsed.references.len(), 1);
    assert_eq!(parsed.references[0].entity_type, "task");
    assert_eq!(parsed.references[0].entity_id, "task-1");
    assert_eq!(parsed.references[0].label(), Some("Sample"));
}

#[tokio::test]
async fn test_training_wheels_holds_create_task() {
    let repo = workspace().await;
    let executor = TrustGatedExecutor::new(repo.clone());
    let op = LlmOperation::from_record(&json!({"op": "create_task", "params": {"title": "X"}}))
        .unwrap();

    let result = executor
        .execute(OWNER, vec![op], TrustMode::TrainingWheels, &ExecutionContext::default())
        .await;

    let wire = serde_json::to_value(&result).unwrap();
    assert_eq!(wire["applied"], json!([]));
    assert_eq!(
        wire["pending"],
        json!([{"op": "create_task", "params": {"title": "X"}}])
    );
    assert_eq!(wire["errors"], json!([]));
}

#[tokio::test]
async fn test_two_projects_named_ops_are_ambiguous() {
    let repo = workspace().await;
    repo.add_project(OWNER, "project-ops-2", "Ops").await;
    let resolver = SemanticResolver::new(repo.clone());
    let snapshot = ContextSnapshot {
        projects: repo.get_projects(OWNER).await.unwrap(),
        ..Default::default()
    };

    let err = resolver
        .resolve_project(OWNER, "Ops", Some(&snapshot), &ResolveFocus::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::MultipleMatches { kind: "project", count: 2, .. }
    ));

    // the executor refuses to pick one and mutates nothing
    let executor = TrustGatedExecutor::new(repo.clone());
    let delete =
        LlmOperation::from_record(&json!({"op": "delete_project", "params": {"projects": "Ops"}}))
            .unwrap();
    let result = executor
        .execute(OWNER, vec![delete], TrustMode::Autonomous, &ExecutionContext::default())
        .await;
    assert_eq!(result.errors.len(), 1);
    assert_eq!(repo.get_projects(OWNER).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_task_is_pending_under_supervised() {
    let repo = workspace().await;
    let executor = TrustGatedExecutor::new(repo.clone());
    let delete =
        LlmOperation::from_record(&json!({"op": "delete_task", "params": {"tasks": ["task-2"]}}))
            .unwrap();
    let result = executor
        .execute(OWNER, vec![delete.clone()], TrustMode::Supervised, &ExecutionContext::default())
        .await;
    assert!(result.applied.is_empty());
    assert_eq!(result.pending, vec![delete]);
    assert!(repo.get_task(OWNER, "task-2").await.is_ok());
}

#[tokio::test]
async fn test_apply_then_undo_round_trip() {
    let repo = workspace().await;
    let executor = TrustGatedExecutor::new(repo.clone());
    let undo = UndoEngine::new(repo.clone());

    let ops = vec![
        LlmOperation::from_record(&json!({"op": "create_task", "params": {"title": "Draft plan", "project": "Ops"}})).unwrap(),
        LlmOperation::from_record(&json!({"op": "update_task_status", "params": {"task": "Sample", "status": "blocked"}})).unwrap(),
        LlmOperation::from_record(&json!({"op": "delete_task", "params": {"tasks": ["Write docs"]}})).unwrap(),
    ];
    let result = executor
        .execute(OWNER, ops, TrustMode::Autonomous, &ExecutionContext::default())
        .await;
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.applied_names(),
        vec!["create_task", "update_task_status", "delete_task"]
    );
    assert_eq!(repo.get_tasks(OWNER).await.unwrap().len(), 2);

    // reverse in the opposite order
    for applied in result.applied.iter().rev() {
        undo.undo(OWNER, applied).await.unwrap();
    }

    let tasks = repo.get_tasks(OWNER).await.unwrap();
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert!(titles.contains(&"Write docs"));
    assert!(!titles.contains(&"Draft plan"));
    assert_eq!(
        repo.get_task(OWNER, "task-1").await.unwrap().status,
        TaskStatus::Backlog
    );
}

#[tokio::test]
async fn test_focus_alias_in_task_workroom() {
    let repo = workspace().await;
    let executor = TrustGatedExecutor::new(repo.clone());
    let ctx = ExecutionContext::for_thread("thread-1").with_focus(ResolveFocus::task("task-1"));

    let ops = vec![
        LlmOperation::from_record(&json!({"op": "create_task", "params": {"title": "Follow up", "project": "current project"}})).unwrap(),
        LlmOperation::from_record(&json!({"op": "update_task_status", "params": {"task": "this task", "status": "doing"}})).unwrap(),
    ];
    let result = executor.execute(OWNER, ops, TrustMode::Supervised, &ctx).await;
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let follow_up = repo
        .get_tasks(OWNER)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.title == "Follow up")
        .unwrap();
    assert_eq!(follow_up.project_id.as_deref(), Some("project-ops"));
    assert_eq!(
        repo.get_task(OWNER, "task-1").await.unwrap().status,
        TaskStatus::Doing
    );
}
