//! Parsed token types
//!
//! Produced by the token parser and immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token kind tag (`[ref ...]` or `[op ...]`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Ref,
    Op,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Ref => "ref",
            TokenKind::Op => "op",
        }
    }

    /// Placeholder prefix used in `llm_text` (`REF` / `OP`)
    pub fn placeholder_prefix(&self) -> &'static str {
        match self {
            TokenKind::Ref => "REF",
            TokenKind::Op => "OP",
        }
    }
}

/// Format the marker substituted into `llm_text` for a placeholder name
pub fn placeholder_marker(placeholder: &str) -> String {
    format!("<<{}>>", placeholder)
}

/// Strip `<<` / `>>` from a marker, returning the bare placeholder name
pub fn bare_placeholder(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("<<")
        .and_then(|s| s.strip_suffix(">>"))
        .unwrap_or(trimmed)
}

/// A `[ref ...]` token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRef {
    /// Bare placeholder name (`REF_1`)
    pub placeholder: String,
    pub version: u32,
    pub entity_type: String,
    pub entity_id: String,
    /// Any keys beyond `v`, `type` and `id`
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl ParsedRef {
    pub fn marker(&self) -> String {
        placeholder_marker(&self.placeholder)
    }

    /// Human label carried in metadata (`name` or `title`), if any
    pub fn label(&self) -> Option<&str> {
        self.meta
            .get("name")
            .or_else(|| self.meta.get("title"))
            .map(String::as_str)
    }
}

/// An `[op ...]` token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOp {
    /// Bare placeholder name (`OP_1`)
    pub placeholder: String,
    pub version: u32,
    pub op_type: String,
    /// Any keys beyond `v` and `type`
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl ParsedOp {
    pub fn marker(&self) -> String {
        placeholder_marker(&self.placeholder)
    }
}

/// Result of parsing a message
///
/// Every `<<REF_n>>` / `<<OP_n>>` marker in `llm_text` corresponds to exactly
/// one entry in `references` / `operations`, numbered in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub raw_text: String,
    pub llm_text: String,
    pub references: Vec<ParsedRef>,
    pub operations: Vec<ParsedOp>,
}

impl ParsedMessage {
    pub fn has_tokens(&self) -> bool {
        !self.references.is_empty() || !self.operations.is_empty()
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }
}
