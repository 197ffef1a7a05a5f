//! Reference and argument validation for parsed messages

pub mod types;
pub mod validator;

pub use types::{ResolvedReference, ValidationErrorCode, ValidationFailure, ValidationResult};
pub use validator::{id_argument, IdArgument, ReferenceValidator};
