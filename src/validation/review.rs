// Persisted review of a request: checklist plus the law list it is evaluated against

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checklist::{ChecklistError, StepUpdate, ValidationChecklist};
use super::forms::DynamicForm;
use super::gate::ValidationGate;
use super::laws::Law;
use crate::request::{ActorId, Decision, RequestId};

/// Review state for one request.
///
/// The applicable laws are captured when the review starts so the gate can be
/// evaluated again later from persisted data alone, even if the catalog moves on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub request_id: RequestId,
    pub reviewer: ActorId,
    pub checklist: ValidationChecklist,
    pub laws: Vec<Law>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<DynamicForm>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl ReviewRecord {
    pub fn open(
        request_id: RequestId,
        reviewer: ActorId,
        laws: Vec<Law>,
        form: Option<DynamicForm>,
        now: DateTime<Utc>,
    ) -> Result<Self, ChecklistError> {
        let checklist = ValidationChecklist::for_laws(&laws)?;
        Ok(Self {
            request_id,
            reviewer,
            checklist,
            laws,
            form,
            started_at: now,
            updated_at: now,
            closed_at: None,
        })
    }

    pub fn gate(&self) -> ValidationGate<'_> {
        ValidationGate::new(&self.checklist, &self.laws)
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Returns the updated record, leaving `self` as it was on error
    pub fn with_update(&self, update: &StepUpdate, now: DateTime<Utc>) -> Result<Self, ChecklistError> {
        let mut next = self.clone();
        next.checklist.apply(update)?;
        next.updated_at = now;
        Ok(next)
    }

    pub fn closed(&self, decision: Option<Decision>, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(decision) = decision {
            next.checklist.decision = decision;
        }
        next.updated_at = now;
        next.closed_at = Some(now);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{LawId, ValidationStep};

    fn review() -> ReviewRecord {
        ReviewRecord::open(
            RequestId::new(),
            ActorId::new("emp-042"),
            vec![
                Law::mandatory("LAW-28-00", "Gestion des déchets"),
                Law::optional("ISO-14001", "Management environnemental"),
            ],
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_update_produces_new_record() {
        let original = review();
        let updated = original
            .with_update(
                &StepUpdate::LegalCompliance {
                    law_id: LawId::from("LAW-28-00"),
                    value: true,
                },
                Utc::now(),
            )
            .unwrap();
        assert!(!original.checklist.is_compliant(&LawId::from("LAW-28-00")));
        assert!(updated.gate().is_step_complete(ValidationStep::LegalCompliance));
    }

    #[test]
    fn test_close_stamps_decision() {
        let closed = review().closed(Some(Decision::Reject), Utc::now());
        assert!(!closed.is_open());
        assert_eq!(closed.checklist.decision, Decision::Reject);
    }

    #[test]
    fn test_review_round_trips_through_json() {
        let original = review();
        let json = serde_json::to_string(&original).unwrap();
        let restored: ReviewRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }
}
