//! End-to-end operation pipeline for a conversation thread

pub mod contract;
pub mod locks;
pub mod orchestrator;

pub use contract::{ContractPayload, ReferenceSummary};
pub use locks::ThreadLockRegistry;
pub use orchestrator::{
    OperationPipeline, OperationProposer, PipelineOutcome, PipelineReport, PipelineRequest,
};
