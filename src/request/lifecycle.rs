// Request lifecycle state machine
//
// The transition table is data: every edge lives in TRANSITIONS and both the
// guard (`next_status`) and the introspection helpers read from it.

use serde::Serialize;
use thiserror::Error;

use super::types::{Operation, RequestStatus};

/// One edge of the lifecycle graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// `None` for operations that create a new request
    pub from: Option<RequestStatus>,
    pub to: RequestStatus,
    pub operation: Operation,
    pub precondition: &'static str,
}

/// Resubmission leaves the rejected request untouched; its `to` is the status of
/// the new request it creates.
pub const TRANSITIONS: &[Transition] = &[
    Transition {
        from: None,
        to: RequestStatus::Draft,
        operation: Operation::CreateDraft,
        precondition: "well-formed payload",
    },
    Transition {
        from: None,
        to: RequestStatus::Submitted,
        operation: Operation::SubmitNew,
        precondition: "required fields present, at least one document or structured data",
    },
    Transition {
        from: Some(RequestStatus::Draft),
        to: RequestStatus::Submitted,
        operation: Operation::Submit,
        precondition: "required fields present, at least one document or structured data",
    },
    Transition {
        from: Some(RequestStatus::Submitted),
        to: RequestStatus::UnderReview,
        operation: Operation::AssignToMe,
        precondition: "caller can review, assignee unset",
    },
    Transition {
        from: Some(RequestStatus::UnderReview),
        to: RequestStatus::Approved,
        operation: Operation::ApproveAndGenerate,
        precondition: "validation gate satisfied",
    },
    Transition {
        from: Some(RequestStatus::UnderReview),
        to: RequestStatus::Rejected,
        operation: Operation::Reject,
        precondition: "rejection reason non-empty",
    },
    Transition {
        from: Some(RequestStatus::Rejected),
        to: RequestStatus::Submitted,
        operation: Operation::Resubmit,
        precondition: "original rejected and not yet resubmitted",
    },
    Transition {
        from: Some(RequestStatus::Draft),
        to: RequestStatus::Cancelled,
        operation: Operation::Cancel,
        precondition: "requester-initiated",
    },
    Transition {
        from: Some(RequestStatus::Submitted),
        to: RequestStatus::Cancelled,
        operation: Operation::Cancel,
        precondition: "requester-initiated",
    },
    Transition {
        from: Some(RequestStatus::UnderReview),
        to: RequestStatus::Cancelled,
        operation: Operation::Cancel,
        precondition: "requester-initiated",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("operation {operation} is not allowed from status {current}")]
    NotAllowed {
        current: RequestStatus,
        operation: Operation,
    },
    #[error("operation {operation} operates on an existing request")]
    RequiresExisting { operation: Operation },
    #[error("operation {operation} creates a new request and cannot be applied to one")]
    CreatesNew { operation: Operation },
}

/// Status reached by applying `operation` to a request in `current`.
///
/// For `Resubmit` the returned status belongs to the newly created request.
pub fn next_status(
    current: RequestStatus,
    operation: Operation,
) -> Result<RequestStatus, TransitionError> {
    if matches!(operation, Operation::CreateDraft | Operation::SubmitNew) {
        return Err(TransitionError::CreatesNew { operation });
    }
    TRANSITIONS
        .iter()
        .find(|t| t.from == Some(current) && t.operation == operation)
        .map(|t| t.to)
        .ok_or(TransitionError::NotAllowed { current, operation })
}

/// Status a brand new request starts in for a creating operation
pub fn initial_status(operation: Operation) -> Result<RequestStatus, TransitionError> {
    TRANSITIONS
        .iter()
        .find(|t| t.from.is_none() && t.operation == operation)
        .map(|t| t.to)
        .ok_or(TransitionError::RequiresExisting { operation })
}

/// Operations that may be applied to a request in `current`
pub fn allowed_operations(current: RequestStatus) -> Vec<Operation> {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == Some(current))
        .map(|t| t.operation)
        .collect()
}
