// Certification request domain: entity types and the lifecycle state machine

pub mod lifecycle;
pub mod types;

pub use lifecycle::{allowed_operations, next_status, Transition, TransitionError, TRANSITIONS};
pub use types::{
    Actor, ActorId, CertificationRequest, Decision, Operation, RequestId, RequestPayload,
    RequestStatus, Role, SupportingDocument, TransitionRecord, TreatmentType,
};
