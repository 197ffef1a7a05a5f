//! Reference validator
//!
//! Resolves every `[ref ...]` token against the workspace repository, then
//! checks that id-bearing arguments of `[op ...]` tokens point at something
//! real. Validation is fail-fast: the first problem becomes the result and
//! nothing after it is looked up.

use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{ResolvedReference, ValidationErrorCode, ValidationFailure, ValidationResult};
use crate::error::RepoError;
use crate::ops::model::{
    LlmOperation, OP_CREATE_TASK, OP_DELETE_PROJECT, OP_DELETE_TASK, OP_LINK_ACTION_TO_TASK,
    OP_UPDATE_ACTION_STATE, OP_UPDATE_TASK_STATUS,
};
use crate::repository::{EntityKind, WorkspaceRepository};
use crate::tokens::{bare_placeholder, ParsedMessage, ParsedOp, TokenKind};

/// How an operation argument names an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdArgument {
    pub kind: EntityKind,
    /// Comma-separated list of ids
    pub list: bool,
}

impl IdArgument {
    const fn one(kind: EntityKind) -> Self {
        Self { kind, list: false }
    }

    const fn many(kind: EntityKind) -> Self {
        Self { kind, list: true }
    }
}

/// Id-bearing arguments per operation type; `None` for free-form arguments
pub fn id_argument(op_type: &str, arg: &str) -> Option<IdArgument> {
    use EntityKind::*;
    match (op_type, arg) {
        (OP_CREATE_TASK, "project" | "project_id") => Some(IdArgument::one(Project)),
        (OP_CREATE_TASK, "from_action" | "from_action_id") => Some(IdArgument::one(Action)),
        (OP_UPDATE_TASK_STATUS, "task" | "task_id") => Some(IdArgument::one(Task)),
        (OP_LINK_ACTION_TO_TASK, "action" | "action_id") => Some(IdArgument::one(Action)),
        (OP_LINK_ACTION_TO_TASK, "task" | "task_id") => Some(IdArgument::one(Task)),
        (OP_UPDATE_ACTION_STATE, "action" | "action_id") => Some(IdArgument::one(Action)),
        (OP_DELETE_TASK, "task" | "task_id" | "tasks" | "task_ids") => {
            Some(IdArgument::many(Task))
        }
        (OP_DELETE_PROJECT, "project" | "project_id" | "projects" | "project_ids") => {
            Some(IdArgument::many(Project))
        }
        _ => None,
    }
}

pub struct ReferenceValidator {
    repo: Arc<dyn WorkspaceRepository>,
}

impl ReferenceValidator {
    pub fn new(repo: Arc<dyn WorkspaceRepository>) -> Self {
        Self { repo }
    }

    /// Validate a parsed message for `owner`
    ///
    /// A missing owner fails with `SYSTEM_ERROR` before any lookup happens.
    pub async fn validate(&self, parsed: &ParsedMessage, owner: Option<&str>) -> ValidationResult {
        let Some(owner) = owner.filter(|o| !o.trim().is_empty()) else {
            return ValidationResult::Failure(ValidationFailure::new(
                ValidationErrorCode::SystemError,
                "Missing caller identity",
            ));
        };

        let mut references = Vec::with_capacity(parsed.references.len());
        for reference in &parsed.references {
            let kind = match reference.entity_type.parse::<EntityKind>() {
                Ok(kind) => kind,
                Err(message) => {
                    return ValidationResult::Failure(
                        ValidationFailure::new(ValidationErrorCode::RefNotFound, message)
                            .with_placeholder(&reference.placeholder),
                    );
                }
            };

            match self.repo.get_entity(owner, kind, &reference.entity_id).await {
                Ok(record) => {
                    debug!(
                        placeholder = %reference.placeholder,
                        kind = %kind,
                        id = %reference.entity_id,
                        "reference resolved"
                    );
                    references.push(ResolvedReference {
                        reference: reference.clone(),
                        record,
                    });
                }
                Err(e) => {
                    warn!(placeholder = %reference.placeholder, error = %e, "reference lookup failed");
                    let code = match e {
                        RepoError::Forbidden { .. } => ValidationErrorCode::RefForbidden,
                        _ => ValidationErrorCode::RefNotFound,
                    };
                    return ValidationResult::Failure(
                        ValidationFailure::new(code, e.to_string())
                            .with_placeholder(&reference.placeholder),
                    );
                }
            }
        }

        for op in &parsed.operations {
            if let Err(failure) = self.check_operation(owner, op, &references).await {
                return ValidationResult::Failure(failure);
            }
        }

        ValidationResult::Success {
            references,
            operations: parsed.operations.clone(),
        }
    }

    async fn check_operation(
        &self,
        owner: &str,
        op: &ParsedOp,
        references: &[ResolvedReference],
    ) -> Result<(), ValidationFailure> {
        // unknown types and malformed arguments never reach the proposer
        if let Err(e) = LlmOperation::from_parsed_op(op) {
            warn!(placeholder = %op.placeholder, op = %op.op_type, error = %e, "operation token rejected");
            let mut failure = ValidationFailure::new(ValidationErrorCode::OpInvalidArgs, e.to_string())
                .with_placeholder(&op.placeholder);
            failure.operation = Some(op.op_type.clone());
            return Err(failure);
        }

        for (arg, raw) in &op.args {
            let Some(expected) = id_argument(&op.op_type, arg) else {
                continue;
            };
            let values: Vec<&str> = if expected.list {
                raw.split(',').map(str::trim).filter(|v| !v.is_empty()).collect()
            } else {
                vec![raw.trim()]
            };
            for value in values {
                self.check_value(owner, op, arg, value, expected.kind, references)
                    .await?;
            }
        }
        Ok(())
    }

    async fn check_value(
        &self,
        owner: &str,
        op: &ParsedOp,
        arg: &str,
        value: &str,
        expected: EntityKind,
        references: &[ResolvedReference],
    ) -> Result<(), ValidationFailure> {
        let conflict = |found: EntityKind| {
            ValidationFailure::new(
                ValidationErrorCode::OpConflict,
                format!(
                    "Argument '{}' of '{}' expects a {} but '{}' refers to a {}",
                    arg, op.op_type, expected, value, found
                ),
            )
            .with_argument(op, arg, value)
        };

        // placeholder naming a reference token
        let bare = bare_placeholder(value);
        if bare
            .to_ascii_uppercase()
            .starts_with(TokenKind::Ref.placeholder_prefix())
        {
            if let Some(resolved) = references
                .iter()
                .find(|r| r.reference.placeholder.eq_ignore_ascii_case(bare))
            {
                let found = resolved.record.kind();
                return if found == expected {
                    Ok(())
                } else {
                    Err(conflict(found))
                };
            }
        }

        // id of an already-resolved reference
        let same_id: Vec<EntityKind> = references
            .iter()
            .filter(|r| r.record.id() == value)
            .map(|r| r.record.kind())
            .collect();
        if same_id.contains(&expected) {
            return Ok(());
        }
        if let Some(found) = same_id.first() {
            return Err(conflict(*found));
        }

        match self.repo.get_entity(owner, expected, value).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(op = %op.op_type, arg, value, error = %e, "operation argument lookup failed");
                Err(ValidationFailure::new(
                    ValidationErrorCode::OpInvalidArgs,
                    format!("Argument '{}' of '{}': {}", arg, op.op_type, e),
                )
                .with_argument(op, arg, value))
            }
        }
    }
}
