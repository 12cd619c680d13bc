// deee-certify - certification workflow for e-waste treatment sites
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod external;
pub mod request;
pub mod store;
pub mod telemetry;
pub mod validation;
pub mod workflow;

// Re-export key types for easy access
pub use crate::config::{config, CertifyConfig};
pub use external::{
    CachedLawCatalog, CertificateIssuer, FormCatalog, LawCatalog, LocalCertificateIssuer,
    LocalRejectionReporter, RejectionReporter, StaticCatalog,
};
pub use request::{
    Actor, ActorId, CertificationRequest, Decision, Operation, RequestId, RequestPayload,
    RequestStatus, Role, TreatmentType,
};
pub use store::{InMemoryStore, JsonFileStore, RequestStore, StoreError};
pub use telemetry::{generate_correlation_id, init_telemetry, workflow_span};
pub use validation::{GateReport, Law, LawId, StepUpdate, ValidationChecklist, ValidationGate, ValidationStep};
pub use workflow::{
    ApprovalOutcome, Collaborators, RejectionOutcome, WorkflowError, WorkflowOrchestrator,
};
