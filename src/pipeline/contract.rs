//! Contract payload handed to the operation proposer
//!
//! The proposer only ever sees placeholders and summaries, never the raw
//! token text.

use serde::{Deserialize, Serialize};

use crate::context::FocusCandidates;
use crate::ops::TrustMode;
use crate::tokens::{ParsedMessage, ParsedOp};
use crate::validation::ResolvedReference;

/// What the proposer learns about one `[ref ...]` token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSummary {
    /// `<<REF_n>>` as it appears in `llm_text`
    pub placeholder: String,
    pub entity_type: String,
    pub entity_id: String,
    pub label: String,
}

impl From<&ResolvedReference> for ReferenceSummary {
    fn from(resolved: &ResolvedReference) -> Self {
        Self {
            placeholder: resolved.reference.marker(),
            entity_type: resolved.record.kind().to_string(),
            entity_id: resolved.record.id().to_string(),
            label: resolved.record.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPayload {
    pub thread_id: Option<String>,
    pub llm_text: String,
    pub references: Vec<ReferenceSummary>,
    /// Present only when the message carried no reference tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<FocusCandidates>,
    pub operations: Vec<ParsedOp>,
    pub trust_mode: TrustMode,
}

impl ContractPayload {
    pub fn build(
        thread_id: Option<&str>,
        parsed: &ParsedMessage,
        references: &[ResolvedReference],
        focus: Option<FocusCandidates>,
        trust_mode: TrustMode,
    ) -> Self {
        Self {
            thread_id: thread_id.map(String::from),
            llm_text: parsed.llm_text.clone(),
            references: references.iter().map(ReferenceSummary::from).collect(),
            focus,
            operations: parsed.operations.clone(),
            trust_mode,
        }
    }
}
