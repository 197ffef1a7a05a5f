//! Trust-gated execution of proposed operations

pub mod executor;
pub mod fallback;
pub mod result;

pub use executor::{ExecutionContext, TrustGatedExecutor};
pub use fallback::{duplicate_name_message, fallback_message};
pub use result::{ApprovalOutcome, AppliedOperation, ExecutionResult, FailedOperation, PriorState};
