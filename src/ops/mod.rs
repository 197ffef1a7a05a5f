//! Operation domain model
//!
//! The closed set of operation kinds an agent may propose, their value
//! domains, and the risk classification used by the trust gate.

pub mod model;
pub mod risk;
pub mod values;

pub use model::{
    parse_operation_batch, ChatParams, CreateTaskParams, DeleteProjectParams, DeleteTaskParams,
    LinkActionToTaskParams, LlmOperation, UpdateActionStateParams, UpdateTaskStatusParams,
};
pub use risk::{RiskTier, TrustMode};
pub use values::{ActionState, Priority, TaskStatus};
