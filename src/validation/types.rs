//! Validation result types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::repository::EntityRecord;
use crate::tokens::{ParsedOp, ParsedRef};

/// Wire-visible validation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorCode {
    RefNotFound,
    RefForbidden,
    OpInvalidArgs,
    OpConflict,
    SystemError,
}

impl ValidationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorCode::RefNotFound => "REF_NOT_FOUND",
            ValidationErrorCode::RefForbidden => "REF_FORBIDDEN",
            ValidationErrorCode::OpInvalidArgs => "OP_INVALID_ARGS",
            ValidationErrorCode::OpConflict => "OP_CONFLICT",
            ValidationErrorCode::SystemError => "SYSTEM_ERROR",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub code: ValidationErrorCode,
    pub message: String,
    /// Placeholder of the offending reference or operation token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ValidationFailure {
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            placeholder: None,
            operation: None,
            argument: None,
            value: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Attach the offending operation token, argument and value
    pub fn with_argument(mut self, op: &ParsedOp, argument: &str, value: &str) -> Self {
        self.placeholder = Some(op.placeholder.clone());
        self.operation = Some(op.op_type.clone());
        self.argument = Some(argument.to_string());
        self.value = Some(value.to_string());
        self
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// A reference token paired with the record it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub reference: ParsedRef,
    pub record: EntityRecord,
}

/// Outcome of validating a parsed message: success or one failure, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    Success {
        references: Vec<ResolvedReference>,
        operations: Vec<ParsedOp>,
    },
    Failure(ValidationFailure),
}

impl ValidationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationResult::Success { .. })
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            ValidationResult::Failure(failure) => Some(failure),
            ValidationResult::Success { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_on_the_wire() {
        let failure = ValidationFailure::new(ValidationErrorCode::OpInvalidArgs, "bad task");
        let json = serde_json::to_value(ValidationResult::Failure(failure)).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["code"], "OP_INVALID_ARGS");
        assert!(json.get("placeholder").is_none());

        for code in [
            ValidationErrorCode::RefNotFound,
            ValidationErrorCode::RefForbidden,
            ValidationErrorCode::OpInvalidArgs,
            ValidationErrorCode::OpConflict,
            ValidationErrorCode::SystemError,
        ] {
            let wire = serde_json::to_value(code).unwrap();
            assert_eq!(wire, code.as_str());
        }
    }
}
