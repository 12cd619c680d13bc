//! Certification workflow orchestration
//!
//! [`WorkflowOrchestrator`] is the single entry point that changes a
//! certification request. It enforces the lifecycle table, the validation gate
//! and the caller's capabilities, serializes operations per request, and
//! persists the request together with its review in one commit.

pub mod errors;
pub mod locks;
pub mod orchestrator;


pub use errors::{ValidationError, WorkflowError};
pub use locks::RequestLocks;
pub use orchestrator::{ApprovalOutcome, Collaborators, RejectionOutcome, WorkflowOrchestrator};
