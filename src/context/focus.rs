//! Focus resolution
//!
//! When a message carries no reference tokens, the UI mode and the thread
//! context decide which task/project the message is implicitly about.
//! Explicit tokens always win, so `focus_for_message` returns `None` as soon
//! as the message has references.
//!
//! | mode               | default task                  | default project                 | candidates        |
//! |--------------------|-------------------------------|---------------------------------|-------------------|
//! | `workroom-task`    | active > pinned > last        | active > pinned > last          | pinned + recent   |
//! | `workroom-project` | -                             | active > pinned > last          | pinned + recent   |
//! | `hub`              | suggested > pinned > last     | pinned > last                   | last + recent     |

use serde::{Deserialize, Serialize};

use super::thread::ThreadContext;
use crate::tokens::ParsedMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UiMode {
    #[default]
    #[serde(rename = "hub")]
    Hub,
    #[serde(rename = "workroom-task")]
    WorkroomTask,
    #[serde(rename = "workroom-project")]
    WorkroomProject,
}

/// What the user is looking at when the message is sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiContext {
    pub mode: UiMode,
    /// Hub only: task the hub is currently suggesting
    #[serde(default)]
    pub suggested_task_id: Option<String>,
    /// Workroom modes: task open in the workroom
    #[serde(default)]
    pub active_task_id: Option<String>,
    /// Workroom modes: project open in the workroom
    #[serde(default)]
    pub active_project_id: Option<String>,
}

impl UiContext {
    pub fn hub() -> Self {
        Self::default()
    }

    pub fn task_workroom(task_id: impl Into<String>, project_id: Option<String>) -> Self {
        Self {
            mode: UiMode::WorkroomTask,
            active_task_id: Some(task_id.into()),
            active_project_id: project_id,
            ..Default::default()
        }
    }

    pub fn project_workroom(project_id: impl Into<String>) -> Self {
        Self {
            mode: UiMode::WorkroomProject,
            active_project_id: Some(project_id.into()),
            ..Default::default()
        }
    }
}

/// Computed focus; never stored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusCandidates {
    pub default_task_id: Option<String>,
    pub default_project_id: Option<String>,
    pub candidate_task_ids: Vec<String>,
    pub candidate_project_ids: Vec<String>,
}

/// Focus for a parsed message, or `None` when it carries reference tokens
pub fn focus_for_message(
    parsed: &ParsedMessage,
    ui: &UiContext,
    context: &ThreadContext,
) -> Option<FocusCandidates> {
    if parsed.has_references() {
        return None;
    }
    Some(resolve_focus(ui, context))
}

/// Compute default and candidate focus ids. Pure: inputs are not modified.
pub fn resolve_focus(ui: &UiContext, context: &ThreadContext) -> FocusCandidates {
    match ui.mode {
        UiMode::WorkroomTask => {
            let default_task_id = first_of([
                &ui.active_task_id,
                &context.pinned_task_id,
                &context.last_task_id,
            ]);
            let default_project_id = first_of([
                &ui.active_project_id,
                &context.pinned_project_id,
                &context.last_project_id,
            ]);
            FocusCandidates {
                candidate_task_ids: candidates(
                    context.pinned_task_id.as_ref(),
                    &context.recent_task_ids,
                    default_task_id.as_deref(),
                ),
                candidate_project_ids: candidates(
                    context.pinned_project_id.as_ref(),
                    &context.recent_project_ids,
                    default_project_id.as_deref(),
                ),
                default_task_id,
                default_project_id,
            }
        }
        UiMode::WorkroomProject => {
            let default_project_id = first_of([
                &ui.active_project_id,
                &context.pinned_project_id,
                &context.last_project_id,
            ]);
            FocusCandidates {
                default_task_id: None,
                candidate_task_ids: Vec::new(),
                candidate_project_ids: candidates(
                    context.pinned_project_id.as_ref(),
                    &context.recent_project_ids,
                    default_project_id.as_deref(),
                ),
                default_project_id,
            }
        }
        UiMode::Hub => {
            let default_task_id = first_of([
                &ui.suggested_task_id,
                &context.pinned_task_id,
                &context.last_task_id,
            ]);
            let default_project_id =
                first_of([&context.pinned_project_id, &context.last_project_id]);
            FocusCandidates {
                candidate_task_ids: candidates(
                    context.last_task_id.as_ref(),
                    &context.recent_task_ids,
                    default_task_id.as_deref(),
                ),
                candidate_project_ids: candidates(
                    context.last_project_id.as_ref(),
                    &context.recent_project_ids,
                    default_project_id.as_deref(),
                ),
                default_task_id,
                default_project_id,
            }
        }
    }
}

fn first_of<const N: usize>(options: [&Option<String>; N]) -> Option<String> {
    options.into_iter().find_map(|o| o.clone())
}

/// `lead` followed by `recent`, de-duplicated, without `exclude`
fn candidates(lead: Option<&String>, recent: &[String], exclude: Option<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in lead.into_iter().chain(recent.iter()) {
        if Some(id.as_str()) != exclude && !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::parse_message;

    fn context() -> ThreadContext {
        ThreadContext {
            thread_id: "th".into(),
            last_task_id: Some("t-last".into()),
            last_project_id: Some("p-last".into()),
            recent_task_ids: vec!["t-last".into(), "t-2".into(), "t-pin".into()],
            recent_project_ids: vec!["p-last".into(), "p-2".into()],
            pinned_task_id: Some("t-pin".into()),
            pinned_project_id: Some("p-pin".into()),
        }
    }

    #[test]
    fn test_task_workroom_prefers_active() {
        let ui = UiContext::task_workroom("t-active", None);
        let focus = resolve_focus(&ui, &context());
        assert_eq!(focus.default_task_id.as_deref(), Some("t-active"));
        assert_eq!(focus.default_project_id.as_deref(), Some("p-pin"));
        assert_eq!(focus.candidate_task_ids, vec!["t-pin", "t-last", "t-2"]);
        assert_eq!(focus.candidate_project_ids, vec!["p-last", "p-2"]);
    }

    #[test]
    fn test_task_workroom_falls_back_to_pinned_then_last() {
        let ui = UiContext {
            mode: UiMode::WorkroomTask,
            ..Default::default()
        };
        let focus = resolve_focus(&ui, &context());
        assert_eq!(focus.default_task_id.as_deref(), Some("t-pin"));
        assert!(!focus.candidate_task_ids.contains(&"t-pin".to_string()));

        let mut ctx = context();
        ctx.pinned_task_id = None;
        let focus = resolve_focus(&ui, &ctx);
        assert_eq!(focus.default_task_id.as_deref(), Some("t-last"));
    }

    #[test]
    fn test_project_workroom_is_project_only() {
        let ui = UiContext::project_workroom("p-active");
        let focus = resolve_focus(&ui, &context());
        assert_eq!(focus.default_task_id, None);
        assert!(focus.candidate_task_ids.is_empty());
        assert_eq!(focus.default_project_id.as_deref(), Some("p-active"));
        assert_eq!(focus.candidate_project_ids, vec!["p-pin", "p-last", "p-2"]);
    }

    #[test]
    fn test_hub_candidates_skip_pins() {
        let ui = UiContext {
            mode: UiMode::Hub,
            suggested_task_id: Some("t-suggested".into()),
            ..Default::default()
        };
        let focus = resolve_focus(&ui, &context());
        assert_eq!(focus.default_task_id.as_deref(), Some("t-suggested"));
        assert_eq!(focus.candidate_task_ids, vec!["t-last", "t-2", "t-pin"]);
        assert_eq!(focus.default_project_id.as_deref(), Some("p-pin"));
        assert_eq!(focus.candidate_project_ids, vec!["p-last", "p-2"]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let ui = UiContext::task_workroom("t-active", Some("p-active".into()));
        let ctx = context();
        let before = ctx.clone();
        let first = resolve_focus(&ui, &ctx);
        let second = resolve_focus(&ui, &ctx);
        assert_eq!(first, second);
        assert_eq!(ctx, before);
    }

    #[test]
    fn test_tokens_win_over_focus() {
        let parsed = parse_message("do [ref v:1 type:task id:t-9] now").unwrap();
        assert!(focus_for_message(&parsed, &UiContext::hub(), &context()).is_none());

        let plain = parse_message("do it now").unwrap();
        assert!(focus_for_message(&plain, &UiContext::hub(), &context()).is_some());
    }

    #[test]
    fn test_ui_mode_wire_names() {
        let ui: UiContext =
            serde_json::from_str(r#"{"mode": "workroom-project", "active_project_id": "p"}"#)
                .unwrap();
        assert_eq!(ui.mode, UiMode::WorkroomProject);
    }
}
