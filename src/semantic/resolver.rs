//! Semantic reference resolver
//!
//! Maps what the agent wrote ("this task", "current project", "Write docs")
//! to a concrete id. Resolution order:
//!
//! 1. UUID-shaped strings are returned unchanged
//! 2. an exact id of an entity of the right kind
//! 3. alias phrases, resolved through the focus
//! 4. case-insensitive name match against the snapshot (or the repository)
//!
//! Ambiguity is always an error; the resolver never picks one of several
//! matches.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::snapshot::{ContextSnapshot, Named, ResolveFocus};
use crate::error::{ResolveError, ResolveResult};
use crate::repository::WorkspaceRepository;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion
pub const SUGGESTION_THRESHOLD: f64 = 0.85;

const PROJECT_ALIASES: &[&str] = &["current project", "this project"];
const TASK_ALIASES: &[&str] = &["this task", "current task"];
const ACTION_ALIASES: &[&str] = &["this action", "current action"];

fn normalize(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_uuid(term: &str) -> bool {
    Uuid::parse_str(term.trim()).is_ok()
}

pub struct SemanticResolver {
    repo: Arc<dyn WorkspaceRepository>,
}

impl SemanticResolver {
    pub fn new(repo: Arc<dyn WorkspaceRepository>) -> Self {
        Self { repo }
    }

    /// True only for the project focus phrases ("current project", "this project")
    pub fn is_project_alias(term: &str) -> bool {
        PROJECT_ALIASES.contains(&normalize(term).as_str())
    }

    pub async fn resolve_task(
        &self,
        owner: &str,
        term: &str,
        snapshot: Option<&ContextSnapshot>,
        focus: &ResolveFocus,
    ) -> ResolveResult<String> {
        let term = term.trim();
        if is_uuid(term) {
            return Ok(term.to_string());
        }
        if TASK_ALIASES.contains(&normalize(term).as_str()) {
            return focus.task_id.clone().ok_or_else(|| ResolveError::MissingFocus {
                kind: "task",
                alias: term.to_string(),
            });
        }

        let loaded;
        let tasks = match snapshot {
            Some(s) => &s.tasks,
            None => {
                loaded = self.repo.get_tasks(owner).await?;
                &loaded
            }
        };
        match_one("task", term, tasks)?.ok_or_else(|| not_found("task", term, tasks))
    }

    pub async fn resolve_action(
        &self,
        owner: &str,
        term: &str,
        snapshot: Option<&ContextSnapshot>,
        focus: &ResolveFocus,
    ) -> ResolveResult<String> {
        let term = term.trim();
        if is_uuid(term) {
            return Ok(term.to_string());
        }
        if ACTION_ALIASES.contains(&normalize(term).as_str()) {
            return focus.action_id.clone().ok_or_else(|| ResolveError::MissingFocus {
                kind: "action",
                alias: term.to_string(),
            });
        }

        let loaded;
        let actions = match snapshot {
            Some(s) => &s.actions,
            None => {
                loaded = self.repo.get_action_items(owner).await?;
                &loaded
            }
        };
        match_one("action", term, actions)?.ok_or_else(|| not_found("action", term, actions))
    }

    /// Resolve a project; `Ok(None)` when nothing matches
    pub async fn resolve_project(
        &self,
        owner: &str,
        term: &str,
        snapshot: Option<&ContextSnapshot>,
        focus: &ResolveFocus,
    ) -> ResolveResult<Option<String>> {
        let term = term.trim();
        if is_uuid(term) {
            return Ok(Some(term.to_string()));
        }
        if Self::is_project_alias(term) {
            return self.focus_project(owner, snapshot, focus).await;
        }

        let loaded;
        let projects = match snapshot {
            Some(s) => &s.projects,
            None => {
                loaded = self.repo.get_projects(owner).await?;
                &loaded
            }
        };
        let found = match_one("project", term, projects)?;
        if found.is_none() {
            debug!(term, "no project matches");
        }
        Ok(found)
    }

    /// Project of the focus task, loading the task when the snapshot lacks it
    async fn focus_project(
        &self,
        owner: &str,
        snapshot: Option<&ContextSnapshot>,
        focus: &ResolveFocus,
    ) -> ResolveResult<Option<String>> {
        let Some(task_id) = focus.task_id.as_deref() else {
            return Ok(None);
        };
        if let Some(task) = snapshot.and_then(|s| s.task(task_id)) {
            return Ok(task.project_id.clone());
        }
        match self.repo.get_task(owner, task_id).await {
            Ok(task) => Ok(task.project_id),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Exact id, then unique case-insensitive name
fn match_one<T: Named>(kind: &'static str, term: &str, items: &[T]) -> ResolveResult<Option<String>> {
    if let Some(item) = items.iter().find(|i| i.id() == term) {
        return Ok(Some(item.id().to_string()));
    }

    let wanted = normalize(term);
    let matches: Vec<&T> = items.iter().filter(|i| normalize(i.name()) == wanted).collect();
    match matches.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(only.id().to_string())),
        many => Err(ResolveError::MultipleMatches {
            kind,
            term: term.to_string(),
            count: many.len(),
            ids: many.iter().map(|i| i.id().to_string()).collect(),
        }),
    }
}

fn not_found<T: Named>(kind: &'static str, term: &str, items: &[T]) -> ResolveError {
    let wanted = normalize(term);
    let suggestion = items
        .iter()
        .map(|i| (strsim::jaro_winkler(&wanted, &normalize(i.name())), i.name()))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, name)| name.to_string());
    ResolveError::NotFound {
        kind,
        term: term.to_string(),
        suggestion,
    }
}
