//! Operation pipeline
//!
//! One full run for a conversation thread:
//!
//! 1. lock the thread (runs without a thread id are not locked)
//! 2. skip input batches that already produced a reply
//! 3. parse tokens, then validate them or resolve focus
//! 4. ask the proposer for operations and parse the batch
//! 5. execute under the trust mode
//! 6. mark the batch answered, then record resolved references in thread
//!    context and persist it
//!
//! Once execution has run the outcome is always `Completed`: a thread context
//! that fails to save is logged and flagged on the report, never turned into
//! an error that would drop the execution result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::contract::ContractPayload;
use super::locks::ThreadLockRegistry;
use crate::config::OpsConfig;
use crate::context::{focus_for_message, FocusCandidates, ThreadContext, ThreadContextStore, UiContext};
use crate::error::PipelineError;
use crate::execution::{ApprovalOutcome, ExecutionContext, ExecutionResult, TrustGatedExecutor};
use crate::ops::{parse_operation_batch, LlmOperation, TrustMode};
use crate::repository::{EntityKind, WorkspaceRepository};
use crate::semantic::ResolveFocus;
use crate::tokens::{parse_message, ParsedMessage};
use crate::validation::{
    ReferenceValidator, ResolvedReference, ValidationErrorCode, ValidationFailure,
    ValidationResult,
};

/// The external step that turns a contract payload into proposed operations
#[async_trait]
pub trait OperationProposer: Send + Sync {
    /// Untyped proposals: an array of `{op, params}` records or `{"operations": [...]}`
    async fn propose(&self, payload: &ContractPayload) -> anyhow::Result<serde_json::Value>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub owner: Option<String>,
    pub thread_id: Option<String>,
    /// Identifies the pending input; a batch is answered at most once per thread
    pub batch_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub ui: UiContext,
    /// Overrides the configured default
    pub trust_mode: Option<TrustMode>,
}

impl PipelineRequest {
    pub fn new(owner: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn in_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_batch(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    pub fn with_ui(mut self, ui: UiContext) -> Self {
        self.ui = ui;
        self
    }

    pub fn with_trust_mode(mut self, trust_mode: TrustMode) -> Self {
        self.trust_mode = Some(trust_mode);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub parsed: ParsedMessage,
    pub references: Vec<ResolvedReference>,
    pub focus: Option<FocusCandidates>,
    pub trust_mode: TrustMode,
    pub result: ExecutionResult,
    /// False when the thread context could not be persisted after execution
    pub context_saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Completed(Box<PipelineReport>),
    /// Validation failed; nothing was executed
    Rejected(ValidationFailure),
    AlreadyHandled { thread_id: String, batch_id: String },
}

pub struct OperationPipeline {
    contexts: Arc<dyn ThreadContextStore>,
    proposer: Arc<dyn OperationProposer>,
    validator: ReferenceValidator,
    executor: TrustGatedExecutor,
    locks: ThreadLockRegistry,
    /// Last answered input batch per thread
    replied: Mutex<HashMap<String, String>>,
    config: OpsConfig,
}

impl OperationPipeline {
    pub fn new(
        repo: Arc<dyn WorkspaceRepository>,
        contexts: Arc<dyn ThreadContextStore>,
        proposer: Arc<dyn OperationProposer>,
        config: OpsConfig,
    ) -> Self {
        Self {
            contexts,
            proposer,
            validator: ReferenceValidator::new(repo.clone()),
            executor: TrustGatedExecutor::new(repo)
                .with_fallback_messages(config.fallback_messages),
            locks: ThreadLockRegistry::new(),
            replied: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &OpsConfig {
        &self.config
    }

    #[instrument(skip(self, request), fields(thread_id = ?request.thread_id, batch_id = ?request.batch_id))]
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineOutcome, PipelineError> {
        let _guard = match request.thread_id.as_deref() {
            Some(thread_id) => Some(self.locks.acquire(thread_id).await),
            None => None,
        };

        let batch_key = request
            .thread_id
            .clone()
            .zip(request.batch_id.clone());
        if let Some((thread_id, batch_id)) = &batch_key {
            if self.replied.lock().await.get(thread_id) == Some(batch_id) {
                info!("input batch already answered");
                return Ok(PipelineOutcome::AlreadyHandled {
                    thread_id: thread_id.clone(),
                    batch_id: batch_id.clone(),
                });
            }
        }

        let parsed = parse_message(&request.text)?;

        let Some(owner) = request.owner.as_deref().filter(|o| !o.trim().is_empty()) else {
            return Ok(PipelineOutcome::Rejected(ValidationFailure::new(
                ValidationErrorCode::SystemError,
                "Missing caller identity",
            )));
        };

        let references = if parsed.has_tokens() {
            match self.validator.validate(&parsed, Some(owner)).await {
                ValidationResult::Success { references, .. } => references,
                ValidationResult::Failure(failure) => {
                    warn!(code = %failure.code, message = %failure.message, "message rejected");
                    return Ok(PipelineOutcome::Rejected(failure));
                }
            }
        } else {
            Vec::new()
        };

        let mut context = match request.thread_id.as_deref() {
            Some(thread_id) => Some(self.contexts.load(thread_id).await?),
            None => None,
        };
        let focus = focus_for_message(
            &parsed,
            &request.ui,
            context.as_ref().unwrap_or(&ThreadContext::default()),
        );

        let trust_mode = request.trust_mode.unwrap_or(self.config.default_trust_mode);
        let payload = ContractPayload::build(
            request.thread_id.as_deref(),
            &parsed,
            &references,
            focus.clone(),
            trust_mode,
        );
        let proposed = self.proposer.propose(&payload).await?;
        let operations = parse_operation_batch(&proposed);
        debug!(count = operations.len(), "operations proposed");

        let exec_ctx = ExecutionContext {
            thread_id: request.thread_id.clone(),
            snapshot: None,
            focus: resolve_focus_ids(&references, focus.as_ref()),
        };
        let result = self
            .executor
            .execute(owner, operations, trust_mode, &exec_ctx)
            .await;
        info!(
            applied = result.applied.len(),
            pending = result.pending.len(),
            errors = result.errors.len(),
            "pipeline run complete"
        );

        if let Some((thread_id, batch_id)) = batch_key {
            self.replied.lock().await.insert(thread_id, batch_id);
        }

        let mut context_saved = true;
        if let Some(context) = context.as_mut() {
            context.apply_references(&references, self.config.recent_limit);
            if let Err(e) = self.contexts.save(context).await {
                warn!(error = %e, "thread context not saved after execution");
                context_saved = false;
            }
        }

        Ok(PipelineOutcome::Completed(Box::new(PipelineReport {
            parsed,
            references,
            focus,
            trust_mode,
            result,
            context_saved,
        })))
    }

    /// Run a pending operation the user approved, serialized with the thread's runs
    pub async fn approve(
        &self,
        owner: &str,
        thread_id: Option<&str>,
        op: &LlmOperation,
    ) -> ApprovalOutcome {
        let _guard = match thread_id {
            Some(thread_id) => Some(self.locks.acquire(thread_id).await),
            None => None,
        };
        let ctx = ExecutionContext {
            thread_id: thread_id.map(String::from),
            ..Default::default()
        };
        self.executor.execute_approved(owner, op, &ctx).await
    }
}

/// Focus ids for the resolver: explicit references first, then inferred focus
fn resolve_focus_ids(
    references: &[ResolvedReference],
    focus: Option<&FocusCandidates>,
) -> ResolveFocus {
    let first_of = |kind: EntityKind| {
        references
            .iter()
            .find(|r| r.record.kind() == kind)
            .map(|r| r.record.id().to_string())
    };
    ResolveFocus {
        task_id: first_of(EntityKind::Task)
            .or_else(|| focus.and_then(|f| f.default_task_id.clone())),
        action_id: first_of(EntityKind::Action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InMemoryThreadContextStore;
    use crate::repository::InMemoryWorkspace;

    struct SilentProposer;

    #[async_trait]
    impl OperationProposer for SilentProposer {
        async fn propose(&self, _payload: &ContractPayload) -> anyhow::Result<serde_json::Value> {
            Ok(serde_json::json!([]))
        }
    }

    #[tokio::test]
    async fn test_only_last_batch_per_thread_is_kept() {
        let pipeline = OperationPipeline::new(
            Arc::new(InMemoryWorkspace::new()),
            Arc::new(InMemoryThreadContextStore::new()),
            Arc::new(SilentProposer),
            OpsConfig::default(),
        );
        for (thread, batch) in [("th-1", "b-1"), ("th-1", "b-2"), ("th-2", "b-1")] {
            let request = PipelineRequest::new("u1", "hi")
                .in_thread(thread)
                .with_batch(batch);
            pipeline.run(request).await.unwrap();
        }

        let replied = pipeline.replied.lock().await;
        assert_eq!(replied.len(), 2);
        assert_eq!(replied.get("th-1").map(String::as_str), Some("b-2"));
        assert_eq!(replied.get("th-2").map(String::as_str), Some("b-1"));
    }
}
