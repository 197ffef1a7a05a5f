//! Inline token parsing
//!
//! Turns text carrying `[ref ...]` / `[op ...]` tokens into a
//! placeholder-substituted text for the LLM plus the structured tokens.
//! Parsing is a pure function of the input.

pub mod parser;
pub mod types;

pub use parser::parse_message;
pub use types::{
    bare_placeholder, placeholder_marker, ParsedMessage, ParsedOp, ParsedRef, TokenKind,
};
