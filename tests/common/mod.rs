// Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use deee_certify::config::WorkflowConfig;
use deee_certify::request::{
    Actor, CertificationRequest, RequestPayload, SupportingDocument, TreatmentType,
};
use deee_certify::store::InMemoryStore;
use deee_certify::validation::{LawId, StepUpdate};
use deee_certify::{
    Collaborators, LocalCertificateIssuer, LocalRejectionReporter, StaticCatalog,
    WorkflowOrchestrator,
};

pub const RECYCLING_MANDATORY_LAWS: [&str; 3] = ["LAW-28-00", "DEC-2-14-85", "LAW-11-03"];

pub struct TestWorkflow {
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub store: Arc<InMemoryStore>,
    pub issuer: Arc<LocalCertificateIssuer>,
    pub reporter: Arc<LocalRejectionReporter>,
}

impl TestWorkflow {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let catalog = Arc::new(StaticCatalog::builtin().expect("bundled catalog"));
        let issuer = Arc::new(LocalCertificateIssuer::new(365));
        let reporter = Arc::new(LocalRejectionReporter::new());
        let orchestrator = WorkflowOrchestrator::new(
            store.clone(),
            Collaborators {
                laws: catalog.clone(),
                forms: catalog,
                certificates: issuer.clone(),
                rejections: reporter.clone(),
            },
            &WorkflowConfig::default(),
        );
        Self {
            orchestrator: Arc::new(orchestrator),
            store,
            issuer,
            reporter,
        }
    }

    pub async fn submitted(&self, treatment_type: TreatmentType) -> CertificationRequest {
        self.orchestrator
            .submit_new(&enterprise(), treatment_type, payload())
            .await
            .expect("submission")
    }

    pub async fn under_review(&self, treatment_type: TreatmentType) -> CertificationRequest {
        let request = self.submitted(treatment_type).await;
        self.orchestrator
            .assign_to_me(&request.id, &employee())
            .await
            .expect("assignment")
    }

    /// Check documents, the given laws and technical validation
    pub async fn record_all(&self, request: &CertificationRequest, laws: &[&str]) {
        let id = &request.id;
        self.orchestrator
            .record_step(id, StepUpdate::DocumentsVerified { value: true })
            .await
            .expect("documents");
        for law in laws {
            self.orchestrator
                .record_step(
                    id,
                    StepUpdate::LegalCompliance {
                        law_id: LawId::from(*law),
                        value: true,
                    },
                )
                .await
                .expect("law");
        }
        self.orchestrator
            .record_step(id, StepUpdate::TechnicalValidation { value: true })
            .await
            .expect("technical");
    }
}

pub fn enterprise() -> Actor {
    Actor::enterprise("green-cycle")
}

pub fn employee() -> Actor {
    Actor::employee("inspector-1")
}

pub fn payload() -> RequestPayload {
    RequestPayload::new("Green Cycle SARL", "Zone Industrielle Es-Senia, Oran")
        .with_description("Recycling of small household appliances")
        .with_document(SupportingDocument::new(
            "operating-permit.pdf",
            "uploads/green-cycle/operating-permit.pdf",
        ))
}
