//! Workroom operations - agent operation protocol for a task/project workspace
//!
//! An agent proposes structured changes against a user's workspace. The text
//! it sees carries opaque placeholders instead of ids; its proposals may name
//! things semantically ("this task", "Ops"). This crate resolves all of that
//! against real data, gates execution on a trust mode, and can reverse what
//! it applied.
//!
//! ## Pipeline
//! text -> tokens -> validation (or focus) -> proposer -> operations ->
//! semantic resolution -> trust-gated execution -> undo on demand
//!
//! ## Quick Start
//!
//! ```rust
//! use workroom_ops::tokens::parse_message;
//!
//! let parsed = parse_message(r#"Link this [ref v:1 type:"task" id:task-1 name:"Sample"] please."#)
//!     .unwrap();
//! assert_eq!(parsed.llm_text, "Link this <<REF_1>> please.");
//! assert_eq!(parsed.references[0].entity_id, "task-1");
//! ```

// Core error handling
pub mod error;

pub mod config;

// Protocol stages, leaves first
pub mod tokens;
pub mod context;
pub mod repository;
pub mod validation;
pub mod ops;
pub mod semantic;
pub mod execution;
pub mod undo;

// Locking, contract payload and the end-to-end run
pub mod pipeline;

pub use config::OpsConfig;
pub use context::{
    focus_for_message, resolve_focus, FocusCandidates, InMemoryThreadContextStore, ThreadContext,
    ThreadContextStore, UiContext, UiMode,
};
pub use error::{
    ConfigError, ExecError, OperationError, PipelineError, RepoError, ResolveError,
    TokenParseError, UndoError,
};
pub use execution::{
    ApprovalOutcome, AppliedOperation, ExecutionContext, ExecutionResult, FailedOperation,
    PriorState, TrustGatedExecutor,
};
pub use ops::{parse_operation_batch, LlmOperation, RiskTier, TrustMode};
pub use pipeline::{
    ContractPayload, OperationPipeline, OperationProposer, PipelineOutcome, PipelineRequest,
    ThreadLockRegistry,
};
pub use repository::{EntityKind, EntityRecord, InMemoryWorkspace, WorkspaceRepository};
pub use semantic::{ContextSnapshot, ResolveFocus, SemanticResolver};
pub use tokens::{parse_message, ParsedMessage, ParsedOp, ParsedRef};
pub use undo::{UndoEngine, UndoOutcome};
pub use validation::{
    ReferenceValidator, ResolvedReference, ValidationErrorCode, ValidationFailure,
    ValidationResult,
};
