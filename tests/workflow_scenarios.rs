// End-to-end certification scenarios against the in-memory adapters

mod common;

use common::{employee, enterprise, payload, TestWorkflow, RECYCLING_MANDATORY_LAWS};
use deee_certify::request::{Actor, Decision, Operation, RequestStatus, TreatmentType};
use deee_certify::store::{JsonFileStore, RequestStore};
use deee_certify::validation::{LawId, StepUpdate, ValidationStep};
use deee_certify::{
    Collaborators, LocalCertificateIssuer, LocalRejectionReporter, StaticCatalog, WorkflowError,
    WorkflowOrchestrator,
};
use std::sync::Arc;

#[tokio::test]
async fn scenario_a_recycling_request_is_certified() {
    let workflow = TestWorkflow::new();
    let request = workflow.under_review(TreatmentType::Recycling).await;

    let checklist = workflow.orchestrator.get_checklist(&request.id).await.unwrap();
    let mandatory: Vec<_> = RECYCLING_MANDATORY_LAWS.iter().map(|l| LawId::from(*l)).collect();
    for law in &mandatory {
        assert_eq!(checklist.legal_compliance.get(law), Some(&false));
    }

    workflow.record_all(&request, &RECYCLING_MANDATORY_LAWS).await;
    let report = workflow.orchestrator.gate_report(&request.id).await.unwrap();
    assert!(report.can_approve);
    assert_eq!(report.current_step, Some(ValidationStep::Decision));

    let outcome = workflow
        .orchestrator
        .approve_and_generate(&request.id)
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Approved);

    let certificates = workflow.issuer.certificates().await;
    assert_eq!(certificates.len(), 1);
    assert_eq!(certificates[0].request_id, request.id);
    assert_eq!(outcome.certificate_id, Some(certificates[0].id.clone()));
    assert!(certificates[0].id.0.starts_with("CERT-"));

    let last = outcome.request.last_transition().unwrap();
    assert_eq!(last.operation, Operation::ApproveAndGenerate);
    assert_eq!(last.actor, Some(employee().id));
}

#[tokio::test]
async fn scenario_b_unchecked_law_is_reported_by_id() {
    let workflow = TestWorkflow::new();
    let request = workflow.under_review(TreatmentType::Recycling).await;
    workflow
        .record_all(&request, &RECYCLING_MANDATORY_LAWS[..2])
        .await;

    assert!(!workflow.orchestrator.can_approve(&request.id).await.unwrap());
    let err = workflow
        .orchestrator
        .approve_and_generate(&request.id)
        .await
        .unwrap_err();

    match err {
        WorkflowError::GateNotSatisfied { gate, .. } => {
            assert_eq!(gate.step, ValidationStep::LegalCompliance);
            assert_eq!(gate.missing_laws, vec![LawId::from("LAW-11-03")]);
            assert!(gate.to_string().contains("LAW-11-03"));
        }
        other => panic!("expected gate failure, got {other:?}"),
    }
    assert_eq!(
        workflow.orchestrator.get_status(&request.id).await.unwrap(),
        RequestStatus::UnderReview
    );
    assert!(workflow.issuer.certificates().await.is_empty());
}

#[tokio::test]
async fn scenario_c_second_assignment_fails() {
    let workflow = TestWorkflow::new();
    let request = workflow.under_review(TreatmentType::Collection).await;

    let err = workflow
        .orchestrator
        .assign_to_me(&request.id, &Actor::employee("inspector-2"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            current: RequestStatus::UnderReview,
            operation: Operation::AssignToMe,
            ..
        }
    ));
    let stored = workflow.orchestrator.get_request(&request.id).await.unwrap();
    assert_eq!(stored, request);
}

#[tokio::test]
async fn scenario_d_rejection_needs_a_reason() {
    let workflow = TestWorkflow::new();
    let request = workflow.under_review(TreatmentType::Dismantling).await;

    let err = workflow.orchestrator.reject(&request.id, "").await.unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert_eq!(
        workflow.orchestrator.get_request(&request.id).await.unwrap(),
        request
    );
    assert!(workflow.reporter.reports().await.is_empty());

    let outcome = workflow
        .orchestrator
        .reject(&request.id, "Storage area not compliant")
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Rejected);
    let reports = workflow.reporter.reports().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].reason, "Storage area not compliant");
}

#[tokio::test]
async fn scenario_e_approved_request_cannot_be_resubmitted() {
    let workflow = TestWorkflow::new();
    let request = workflow.under_review(TreatmentType::Recycling).await;
    workflow.record_all(&request, &RECYCLING_MANDATORY_LAWS).await;
    let approved = workflow
        .orchestrator
        .approve_and_generate(&request.id)
        .await
        .unwrap()
        .request;

    let err = workflow
        .orchestrator
        .resubmit(&request.id, payload())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            current: RequestStatus::Approved,
            operation: Operation::Resubmit,
            ..
        }
    ));
    assert_eq!(
        workflow.orchestrator.get_request(&request.id).await.unwrap(),
        approved
    );
    assert_eq!(workflow.orchestrator.list_requests(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_request_is_resubmitted_and_certified() {
    let workflow = TestWorkflow::new();
    let request = workflow.under_review(TreatmentType::Recycling).await;
    workflow
        .orchestrator
        .reject(&request.id, "Permit expired")
        .await
        .unwrap();
    let rejected = workflow.orchestrator.get_request(&request.id).await.unwrap();

    let fresh = workflow
        .orchestrator
        .resubmit(&request.id, payload().with_description("renewed permit"))
        .await
        .unwrap();
    assert_eq!(fresh.predecessor, Some(request.id));

    let fresh = workflow
        .orchestrator
        .assign_to_me(&fresh.id, &employee())
        .await
        .unwrap();
    workflow.record_all(&fresh, &RECYCLING_MANDATORY_LAWS).await;
    workflow
        .orchestrator
        .record_step(
            &fresh.id,
            StepUpdate::Decision {
                value: Decision::Approve,
            },
        )
        .await
        .unwrap();
    assert!(workflow
        .orchestrator
        .is_step_complete(&fresh.id, ValidationStep::Decision)
        .await
        .unwrap());

    let outcome = workflow
        .orchestrator
        .approve_with_comments(&fresh.id, Some("Permit renewed"))
        .await
        .unwrap();
    assert_eq!(outcome.request.decision_comments.as_deref(), Some("Permit renewed"));

    assert_eq!(
        workflow.orchestrator.get_request(&request.id).await.unwrap(),
        rejected
    );
    let rejected_list = workflow
        .orchestrator
        .list_requests(Some(RequestStatus::Rejected))
        .await
        .unwrap();
    assert_eq!(rejected_list.len(), 1);
}

#[tokio::test]
async fn draft_flow_with_cancellation() {
    let workflow = TestWorkflow::new();
    let draft = workflow
        .orchestrator
        .create_draft(&enterprise(), TreatmentType::Transport, payload())
        .await
        .unwrap();
    assert_eq!(draft.status, RequestStatus::Draft);

    let submitted = workflow
        .orchestrator
        .submit(&draft.id, &enterprise())
        .await
        .unwrap();
    assert_eq!(submitted.status, RequestStatus::Submitted);

    let cancelled = workflow
        .orchestrator
        .cancel(&draft.id, &enterprise())
        .await
        .unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    assert!(cancelled.status.is_terminal());

    let err = workflow
        .orchestrator
        .assign_to_me(&draft.id, &employee())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
}

#[tokio::test]
async fn review_survives_process_restart_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let build = || {
        let catalog = Arc::new(StaticCatalog::builtin().unwrap());
        WorkflowOrchestrator::new(
            Arc::new(JsonFileStore::new(&path)),
            Collaborators {
                laws: catalog.clone(),
                forms: catalog,
                certificates: Arc::new(LocalCertificateIssuer::new(365)),
                rejections: Arc::new(LocalRejectionReporter::new()),
            },
            &Default::default(),
        )
    };

    let first = build();
    let request = first
        .submit_new(&enterprise(), TreatmentType::Recycling, payload())
        .await
        .unwrap();
    first.assign_to_me(&request.id, &employee()).await.unwrap();
    first
        .record_step(&request.id, StepUpdate::DocumentsVerified { value: true })
        .await
        .unwrap();
    drop(first);

    let second = build();
    let checklist = second.get_checklist(&request.id).await.unwrap();
    assert!(checklist.documents_verified);
    assert!(!checklist.technical_validation);
    assert_eq!(
        second.get_status(&request.id).await.unwrap(),
        RequestStatus::UnderReview
    );
    assert!(second.store().get_review(&request.id).await.unwrap().is_some());
}
