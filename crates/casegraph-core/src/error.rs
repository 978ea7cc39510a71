use thiserror::Error;

use crate::types::Category;

/// Why a candidate relation was refused by the rule engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Unknown relation type: {0}")]
    UnknownRelationType(String),

    #[error("Source must be of type {expected}, found labels [{}]", .actual.join(", "))]
    SourceCategoryMismatch {
        expected: Category,
        actual: Vec<String>,
    },

    #[error("Target must be of type {expected}, found labels [{}]", .actual.join(", "))]
    TargetCategoryMismatch {
        expected: Category,
        actual: Vec<String>,
    },

    #[error("Nodes not found: {source_id} -> {target_id}")]
    EndpointNotFound {
        source_id: String,
        target_id: String,
    },
}

/// Top-level error type for case graph operations.
#[derive(Error, Debug)]
pub enum CaseError {
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Relation rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Entity not found: {id}")]
    NotFound { id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Execution error: {0}")]
    Execution(String),
}

/// Coarse error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Execution,
}

impl CaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaseError::InvalidCategory(_)
            | CaseError::MissingField(_)
            | CaseError::InvalidRequest(_) => ErrorKind::Validation,
            CaseError::Rejected(Rejection::EndpointNotFound { .. }) => ErrorKind::NotFound,
            CaseError::Rejected(_) => ErrorKind::Validation,
            CaseError::NotFound { .. } => ErrorKind::NotFound,
            CaseError::Conflict(_) => ErrorKind::Conflict,
            CaseError::Execution(_) => ErrorKind::Execution,
        }
    }

    /// Missing or unparseable input is the caller's fault at the boundary;
    /// store and validation failures are reported as server errors.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CaseError::MissingField(_) | CaseError::InvalidRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, CaseError>;
