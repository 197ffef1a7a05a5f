//! Semantic reference resolution
//!
//! Agents refer to things by name or by focus alias; this module turns those
//! into concrete ids against a context snapshot.

pub mod resolver;
pub mod snapshot;

pub use resolver::{SemanticResolver, SUGGESTION_THRESHOLD};
pub use snapshot::{ContextSnapshot, ResolveFocus};
