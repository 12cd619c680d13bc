// Property-Based Testing for the certification workflow
// Random operation sequences must never corrupt a request, and the gate must
// agree with its definition for any checklist.

mod common;

use common::{employee, enterprise, payload, TestWorkflow};
use deee_certify::request::{Actor, RequestStatus, TreatmentType};
use deee_certify::store::RequestStore;
use deee_certify::validation::{Law, LawId, StepUpdate, ValidationChecklist, ValidationGate};
use proptest::prelude::*;
use proptest_derive::Arbitrary;

const LAW_POOL: [&str; 5] = ["LAW-28-00", "DEC-2-14-85", "LAW-11-03", "ISO-14001", "LAW-99-99"];

#[derive(Debug, Clone, Arbitrary)]
enum Action {
    Submit,
    Assign(#[proptest(strategy = "0usize..3")] usize),
    RecordDocuments(bool),
    RecordLaw(#[proptest(strategy = "0usize..5")] usize, bool),
    RecordTechnical(bool),
    Approve,
    Reject(#[proptest(strategy = "reason_strategy()")] String),
    Resubmit,
    Cancel(bool),
}

fn reason_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        Just("Missing operating permit".to_string()),
    ]
}

fn reviewer(index: usize) -> Actor {
    match index {
        0 => employee(),
        1 => Actor::employee("inspector-2"),
        _ => Actor::enterprise("intruder"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operations_keep_requests_consistent(
        start_as_draft in any::<bool>(),
        actions in prop::collection::vec(any::<Action>(), 1..30),
    ) {
        tokio_test::block_on(async {
            let workflow = TestWorkflow::new();
            let orchestrator = &workflow.orchestrator;
            let request = if start_as_draft {
                orchestrator
                    .create_draft(&enterprise(), TreatmentType::Recycling, payload())
                    .await
                    .unwrap()
            } else {
                workflow.submitted(TreatmentType::Recycling).await
            };
            let id = request.id;
            let mut transitions = 0u64;

            for action in actions {
                let before = orchestrator.get_request(&id).await.unwrap();
                let review_before = workflow.store.get_review(&id).await.unwrap();
                let approvable = before.status == RequestStatus::UnderReview
                    && orchestrator.can_approve(&id).await.unwrap_or(false);

                let (moves_status, result) = match &action {
                    Action::Submit => (true, orchestrator.submit(&id, &enterprise()).await.map(drop)),
                    Action::Assign(who) => (true, orchestrator.assign_to_me(&id, &reviewer(*who)).await.map(drop)),
                    Action::RecordDocuments(value) => (false, orchestrator
                        .record_step(&id, StepUpdate::DocumentsVerified { value: *value })
                        .await
                        .map(drop)),
                    Action::RecordLaw(index, value) => (false, orchestrator
                        .record_step(&id, StepUpdate::LegalCompliance {
                            law_id: LawId::from(LAW_POOL[*index]),
                            value: *value,
                        })
                        .await
                        .map(drop)),
                    Action::RecordTechnical(value) => (false, orchestrator
                        .record_step(&id, StepUpdate::TechnicalValidation { value: *value })
                        .await
                        .map(drop)),
                    Action::Approve => (true, orchestrator.approve_and_generate(&id).await.map(drop)),
                    Action::Reject(reason) => (true, orchestrator.reject(&id, reason).await.map(drop)),
                    Action::Resubmit => (false, orchestrator.resubmit(&id, payload()).await.map(drop)),
                    Action::Cancel(own) => {
                        let actor = if *own { enterprise() } else { Actor::enterprise("someone-else") };
                        (true, orchestrator.cancel(&id, &actor).await.map(drop))
                    }
                };

                let after = orchestrator.get_request(&id).await.unwrap();
                match &result {
                    Err(_) => {
                        prop_assert_eq!(&after, &before);
                        prop_assert_eq!(workflow.store.get_review(&id).await.unwrap(), review_before);
                    }
                    Ok(()) if moves_status => transitions += 1,
                    Ok(()) => {
                        prop_assert_eq!(&after, &before);
                    }
                }
                if matches!(action, Action::Approve) {
                    prop_assert_eq!(result.is_ok(), approvable);
                }
                if before.status.is_terminal() {
                    prop_assert!(result.is_err() || matches!(action, Action::Resubmit));
                }
            }

            let last = orchestrator.get_request(&id).await.unwrap();
            prop_assert_eq!(last.version, transitions);
            prop_assert_eq!(last.history.len() as u64, transitions + 1);
            let certificates = workflow.issuer.certificates().await.len();
            prop_assert_eq!(certificates == 1, last.status == RequestStatus::Approved);
            prop_assert!(certificates <= 1);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn gate_agrees_with_its_definition(
        documents in any::<bool>(),
        technical in any::<bool>(),
        laws in prop::collection::vec(any::<(bool, bool)>(), 0..6),
    ) {
        let catalog: Vec<Law> = laws
            .iter()
            .enumerate()
            .map(|(i, (mandatory, _))| {
                let id = format!("LAW-{i:02}");
                if *mandatory { Law::mandatory(id, "law") } else { Law::optional(id, "law") }
            })
            .collect();
        let mut checklist = ValidationChecklist::for_laws(&catalog).unwrap();
        checklist.apply(&StepUpdate::DocumentsVerified { value: documents }).unwrap();
        checklist.apply(&StepUpdate::TechnicalValidation { value: technical }).unwrap();
        for (law, (_, compliant)) in catalog.iter().zip(&laws) {
            checklist
                .apply(&StepUpdate::LegalCompliance { law_id: law.id.clone(), value: *compliant })
                .unwrap();
        }

        let gate = ValidationGate::new(&checklist, &catalog);
        let missing: Vec<LawId> = catalog
            .iter()
            .zip(&laws)
            .filter(|(_, (mandatory, compliant))| *mandatory && !*compliant)
            .map(|(law, _)| law.id.clone())
            .collect();

        prop_assert_eq!(gate.missing_mandatory_laws(), missing.clone());
        prop_assert_eq!(gate.can_approve(), documents && technical && missing.is_empty());
        prop_assert_eq!(gate.report(), gate.report());
        prop_assert_eq!(gate.check_approval().is_ok(), gate.can_approve());
    }
}
