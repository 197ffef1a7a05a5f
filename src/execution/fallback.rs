//! User-facing messages for failed operations

use crate::error::{ExecError, ResolveError};
use crate::ops::LlmOperation;

/// Canned reply for a name conflict on `entity`
pub fn duplicate_name_message(entity: &str) -> String {
    format!(
        "That {} already exists. Would you like to name it something else?",
        entity
    )
}

/// Short chat message explaining why `op` failed
pub fn fallback_message(op: &LlmOperation, err: &ExecError) -> String {
    match err {
        ExecError::DuplicateName { entity, .. } => duplicate_name_message(entity),
        ExecError::Resolve(ResolveError::MultipleMatches { kind, term, .. }) => format!(
            "I found more than one {} called \"{}\". Which one did you mean?",
            kind, term
        ),
        ExecError::Resolve(ResolveError::NotFound {
            kind,
            term,
            suggestion: Some(suggestion),
        }) => format!(
            "I couldn't find a {} called \"{}\". Did you mean \"{}\"?",
            kind, term, suggestion
        ),
        ExecError::Resolve(ResolveError::NotFound { kind, term, .. }) => {
            format!("I couldn't find a {} called \"{}\".", kind, term)
        }
        ExecError::Resolve(ResolveError::MissingFocus { kind, .. }) => format!(
            "I'm not sure which {} you mean. Could you tell me its name?",
            kind
        ),
        _ => generic_message(op),
    }
}

fn generic_message(op: &LlmOperation) -> String {
    match op {
        LlmOperation::Chat(_) => "Sorry, I couldn't send that message.".to_string(),
        LlmOperation::CreateTask(p) => {
            format!("Sorry, I couldn't create the task \"{}\".", p.title)
        }
        LlmOperation::UpdateTaskStatus(p) => format!(
            "Sorry, I couldn't move that task to {}.",
            p.status
        ),
        LlmOperation::LinkActionToTask(_) => {
            "Sorry, I couldn't link that action item to the task.".to_string()
        }
        LlmOperation::UpdateActionState(_) => {
            "Sorry, I couldn't update that action item.".to_string()
        }
        LlmOperation::DeleteProject(p) if p.projects.len() > 1 => {
            "Sorry, I couldn't delete those projects.".to_string()
        }
        LlmOperation::DeleteProject(_) => "Sorry, I couldn't delete that project.".to_string(),
        LlmOperation::DeleteTask(p) if p.tasks.len() > 1 => {
            "Sorry, I couldn't delete those tasks.".to_string()
        }
        LlmOperation::DeleteTask(_) => "Sorry, I couldn't delete that task.".to_string(),
    }
}
