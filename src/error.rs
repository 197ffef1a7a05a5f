//! Error types for the workroom operation protocol
//!
//! Each stage of the pipeline owns a typed error built with thiserror:
//! token parsing, operation construction, repository access, semantic
//! resolution, execution and undo. Validation failures are not errors in
//! this sense - they are values (`ValidationResult::Failure`) so they can be
//! surfaced to callers with their wire codes.

use thiserror::Error;

/// Malformed `[ref ...]` / `[op ...]` tokens. Fatal to the whole message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenParseError {
    #[error("{token} token at position {position} is missing required field '{field}'")]
    MissingField {
        token: &'static str,
        field: &'static str,
        position: usize,
    },

    #[error("{token} token at position {position} has invalid version '{value}': expected an integer >= 1")]
    InvalidVersion {
        token: &'static str,
        value: String,
        position: usize,
    },

    #[error("op token at position {position} has no arguments beyond 'v' and 'type'")]
    MissingArguments { position: usize },

    #[error("Malformed {token} token at position {position}: {message}")]
    Malformed {
        token: &'static str,
        position: usize,
        message: String,
    },
}

impl TokenParseError {
    /// Name of the offending field, when the error concerns one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            TokenParseError::MissingField { field, .. } => Some(field),
            TokenParseError::InvalidVersion { .. } => Some("v"),
            TokenParseError::MissingArguments { .. } => Some("arguments"),
            TokenParseError::Malformed { .. } => None,
        }
    }
}

/// Rejections raised while constructing an `LlmOperation` from an untyped record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Operation record must be a JSON object")]
    NotAnObject,

    #[error("Operation record has no 'op' name")]
    MissingOpName,

    #[error("Unknown operation '{op}'")]
    UnknownOperation { op: String },

    #[error("Operation '{op}' is missing required argument '{arg}'")]
    MissingArgument { op: &'static str, arg: &'static str },

    #[error("Operation '{op}' argument '{arg}' has invalid value '{value}'; allowed: {allowed}")]
    InvalidValue {
        op: &'static str,
        arg: &'static str,
        value: String,
        allowed: String,
    },

    #[error("Operation '{op}' argument '{arg}' must be {expected}")]
    InvalidArgumentType {
        op: &'static str,
        arg: &'static str,
        expected: &'static str,
    },
}

/// Conditions signalled by the workspace repository
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("{entity} '{id}' belongs to another owner")]
    Forbidden { entity: String, id: String },

    #[error("A {entity} named '{name}' already exists")]
    DuplicateName { entity: String, name: String },

    #[error("Invalid repository request: {0}")]
    Invalid(String),

    #[error("Repository backend error: {0}")]
    Backend(String),
}

impl RepoError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        RepoError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound { .. })
    }
}

/// Failures while mapping a human-meaningful reference to an id
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No {kind} matches '{term}'{}", suggestion_suffix(.suggestion))]
    NotFound {
        kind: &'static str,
        term: String,
        suggestion: Option<String>,
    },

    #[error("Multiple {kind}s match '{term}' ({count} matches)")]
    MultipleMatches {
        kind: &'static str,
        term: String,
        count: usize,
        ids: Vec<String>,
    },

    #[error("'{alias}' used but no {kind} is in focus")]
    MissingFocus { kind: &'static str, alias: String },

    #[error(transparent)]
    Repository(#[from] RepoError),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

/// Per-operation execution failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// Creating a record whose name already exists for the owner
    #[error("A {entity} named '{name}' already exists")]
    DuplicateName { entity: String, name: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Repository(RepoError),
}

impl From<RepoError> for ExecError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::DuplicateName { entity, name } => ExecError::DuplicateName { entity, name },
            other => ExecError::Repository(other),
        }
    }
}

impl ExecError {
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self, ExecError::DuplicateName { .. })
    }
}

/// Failures while reversing an applied operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UndoError {
    #[error("Operation '{op}' cannot be undone")]
    NotUndoable { op: &'static str },

    #[error("Cannot undo '{op}': missing identifier '{field}'")]
    MissingIdentifier {
        op: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Pipeline-level errors (everything that is not a validation failure)
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Token parse error: {0}")]
    Parse(#[from] TokenParseError),

    #[error("Thread context store error: {0}")]
    ContextStore(#[from] RepoError),

    #[error("Operation proposer failed: {0}")]
    Proposer(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
