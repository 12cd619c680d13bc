// Validation gate: decides whether a review may move to `approved`
//
// Evaluation is a pure read of the checklist and the law list captured when the
// review started. Nothing here depends on which step a UI is showing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::checklist::{ValidationChecklist, ValidationStep};
use super::laws::{Law, LawId};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("validation gate not satisfied at step {step}{}", format_missing(.missing_laws))]
pub struct GateNotSatisfied {
    /// First incomplete step
    pub step: ValidationStep,
    /// Unchecked mandatory laws, only filled for the legal compliance step
    pub missing_laws: Vec<LawId>,
}

fn format_missing(missing: &[LawId]) -> String {
    if missing.is_empty() {
        String::new()
    } else {
        let ids: Vec<&str> = missing.iter().map(LawId::as_str).collect();
        format!(": unchecked mandatory laws [{}]", ids.join(", "))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValidationGate<'a> {
    checklist: &'a ValidationChecklist,
    laws: &'a [Law],
}

impl<'a> ValidationGate<'a> {
    pub fn new(checklist: &'a ValidationChecklist, laws: &'a [Law]) -> Self {
        Self { checklist, laws }
    }

    /// Mandatory laws whose compliance entry is not `true`, in catalog order.
    /// A mandatory law absent from the checklist counts as unchecked.
    pub fn missing_mandatory_laws(&self) -> Vec<LawId> {
        self.laws
            .iter()
            .filter(|law| law.is_mandatory && !self.checklist.is_compliant(&law.id))
            .map(|law| law.id.clone())
            .collect()
    }

    pub fn is_step_complete(&self, step: ValidationStep) -> bool {
        match step {
            ValidationStep::DocumentsVerified => self.checklist.documents_verified,
            ValidationStep::LegalCompliance => self.missing_mandatory_laws().is_empty(),
            ValidationStep::TechnicalValidation => self.checklist.technical_validation,
            ValidationStep::Decision => self.checklist.decision.is_set(),
        }
    }

    /// A step is enterable once every earlier step is complete
    pub fn can_enter(&self, step: ValidationStep) -> bool {
        step.predecessors().all(|s| self.is_step_complete(s))
    }

    pub fn first_incomplete_step(&self) -> Option<ValidationStep> {
        ValidationStep::ALL
            .into_iter()
            .find(|s| !self.is_step_complete(*s))
    }

    /// Steps 1-3 complete. The decision step is the approval itself.
    pub fn can_approve(&self) -> bool {
        self.check_approval().is_ok()
    }

    pub fn check_approval(&self) -> Result<(), GateNotSatisfied> {
        let blocking = ValidationStep::ALL
            .into_iter()
            .filter(|s| *s != ValidationStep::Decision)
            .find(|s| !self.is_step_complete(*s));

        match blocking {
            None => Ok(()),
            Some(step) => Err(GateNotSatisfied {
                step,
                missing_laws: if step == ValidationStep::LegalCompliance {
                    self.missing_mandatory_laws()
                } else {
                    Vec::new()
                },
            }),
        }
    }

    pub fn report(&self) -> GateReport {
        GateReport {
            steps: ValidationStep::ALL
                .into_iter()
                .map(|step| StepStatus {
                    step,
                    complete: self.is_step_complete(step),
                    enterable: self.can_enter(step),
                })
                .collect(),
            current_step: self.first_incomplete_step(),
            missing_mandatory_laws: self.missing_mandatory_laws(),
            can_approve: self.can_approve(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    pub step: ValidationStep,
    pub complete: bool,
    pub enterable: bool,
}

/// Snapshot of gate evaluation, suitable for rendering a stepper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReport {
    pub steps: Vec<StepStatus>,
    /// First incomplete step, `None` once all four are complete
    pub current_step: Option<ValidationStep>,
    pub missing_mandatory_laws: Vec<LawId>,
    pub can_approve: bool,
}

impl GateReport {
    pub fn is_complete(&self, step: ValidationStep) -> bool {
        self.steps
            .iter()
            .any(|s| s.step == step && s.complete)
    }
}
