use thiserror::Error;

use crate::external::CollaboratorError;
use crate::request::{ActorId, Operation, RequestId, RequestStatus};
use crate::store::StoreError;
use crate::validation::{ChecklistError, GateNotSatisfied};

/// Malformed caller input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors returned by workflow operations.
///
/// Every error leaves the request and its review exactly as they were.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("cannot {operation} request {request_id}: status is {current}")]
    InvalidTransition {
        request_id: RequestId,
        current: RequestStatus,
        operation: Operation,
    },

    #[error("request {request_id} cannot be approved: {gate}")]
    GateNotSatisfied {
        request_id: RequestId,
        gate: GateNotSatisfied,
    },

    #[error("request {request_id} is not under review (status {current})")]
    NotUnderReview {
        request_id: RequestId,
        current: RequestStatus,
    },

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("request not found: {request_id}")]
    NotFound { request_id: RequestId },

    #[error("{actor} is not allowed to {operation}: {reason}")]
    Unauthorized {
        actor: ActorId,
        operation: Operation,
        reason: String,
    },

    #[error("request {original} was already resubmitted as {successor}")]
    AlreadyResubmitted {
        original: RequestId,
        successor: RequestId,
    },

    #[error("{service} call failed: {source}")]
    Collaborator {
        service: &'static str,
        #[source]
        source: CollaboratorError,
    },

    #[error("{service} did not answer within {timeout_ms} ms")]
    CollaboratorTimeout {
        service: &'static str,
        timeout_ms: u64,
    },

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { request_id } => WorkflowError::NotFound { request_id },
            StoreError::ReviewClosed { request_id, status } => WorkflowError::NotUnderReview {
                request_id,
                current: status,
            },
            other => WorkflowError::Store(other),
        }
    }
}

impl From<ChecklistError> for WorkflowError {
    fn from(err: ChecklistError) -> Self {
        let field = match &err {
            ChecklistError::UnknownLaw { .. } => "law_id",
            ChecklistError::DuplicateLaw { .. } => "legal_compliance",
        };
        WorkflowError::Validation(ValidationError::new(field, err.to_string()))
    }
}

impl WorkflowError {
    /// Gate detail when approval was refused
    pub fn gate_failure(&self) -> Option<&GateNotSatisfied> {
        match self {
            WorkflowError::GateNotSatisfied { gate, .. } => Some(gate),
            _ => None,
        }
    }

    /// Short machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::InvalidTransition { .. } => "invalid_transition",
            WorkflowError::GateNotSatisfied { .. } => "gate_not_satisfied",
            WorkflowError::NotUnderReview { .. } => "not_under_review",
            WorkflowError::Validation(_) => "validation_error",
            WorkflowError::NotFound { .. } => "not_found",
            WorkflowError::Unauthorized { .. } => "unauthorized",
            WorkflowError::AlreadyResubmitted { .. } => "already_resubmitted",
            WorkflowError::Collaborator { .. } => "collaborator_error",
            WorkflowError::CollaboratorTimeout { .. } => "collaborator_timeout",
            WorkflowError::Store(_) => "store_error",
        }
    }
}
