//! Thread-scoped reference memory and focus resolution

pub mod focus;
pub mod thread;

pub use focus::{focus_for_message, resolve_focus, FocusCandidates, UiContext, UiMode};
pub use thread::{InMemoryThreadContextStore, ThreadContext, ThreadContextStore, MAX_RECENT_IDS};
