// Review checklist state and the step updates a reviewer can record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::laws::{Law, LawId};
use crate::request::Decision;

/// The four ordered steps of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStep {
    DocumentsVerified,
    LegalCompliance,
    TechnicalValidation,
    Decision,
}

impl ValidationStep {
    pub const ALL: [ValidationStep; 4] = [
        ValidationStep::DocumentsVerified,
        ValidationStep::LegalCompliance,
        ValidationStep::TechnicalValidation,
        ValidationStep::Decision,
    ];

    /// One-based position as shown to reviewers
    pub fn index(&self) -> usize {
        match self {
            ValidationStep::DocumentsVerified => 1,
            ValidationStep::LegalCompliance => 2,
            ValidationStep::TechnicalValidation => 3,
            ValidationStep::Decision => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.index() == index)
    }

    /// Steps that must be complete before this one can be entered
    pub fn predecessors(&self) -> impl Iterator<Item = ValidationStep> {
        let this = *self;
        Self::ALL.into_iter().take_while(move |s| *s != this)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStep::DocumentsVerified => "documents_verified",
            ValidationStep::LegalCompliance => "legal_compliance",
            ValidationStep::TechnicalValidation => "technical_validation",
            ValidationStep::Decision => "decision",
        }
    }
}

impl fmt::Display for ValidationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index(), self.as_str())
    }
}

impl FromStr for ValidationStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = s.parse::<usize>() {
            return Self::from_index(index).ok_or_else(|| format!("no step {index}"));
        }
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown step: {s}"))
    }
}

/// A single field change recorded by the reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepUpdate {
    DocumentsVerified { value: bool },
    LegalCompliance { law_id: LawId, value: bool },
    TechnicalValidation { value: bool },
    Decision { value: Decision },
}

impl StepUpdate {
    pub fn step(&self) -> ValidationStep {
        match self {
            StepUpdate::DocumentsVerified { .. } => ValidationStep::DocumentsVerified,
            StepUpdate::LegalCompliance { .. } => ValidationStep::LegalCompliance,
            StepUpdate::TechnicalValidation { .. } => ValidationStep::TechnicalValidation,
            StepUpdate::Decision { .. } => ValidationStep::Decision,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecklistError {
    #[error("law {law_id} is not applicable to this review")]
    UnknownLaw { law_id: LawId },
    #[error("law {law_id} appears more than once in the applicable law list")]
    DuplicateLaw { law_id: LawId },
}

/// Ephemeral per-review checklist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationChecklist {
    pub documents_verified: bool,
    /// Exactly one entry per applicable law
    pub legal_compliance: BTreeMap<LawId, bool>,
    pub technical_validation: bool,
    pub decision: Decision,
}

impl ValidationChecklist {
    /// Fresh checklist with every law entry defaulted to `false`
    pub fn for_laws(laws: &[Law]) -> Result<Self, ChecklistError> {
        let mut legal_compliance = BTreeMap::new();
        for law in laws {
            if legal_compliance.insert(law.id.clone(), false).is_some() {
                return Err(ChecklistError::DuplicateLaw {
                    law_id: law.id.clone(),
                });
            }
        }
        Ok(Self {
            legal_compliance,
            ..Default::default()
        })
    }

    /// Apply one update. The checklist is untouched when the update is rejected.
    pub fn apply(&mut self, update: &StepUpdate) -> Result<(), ChecklistError> {
        match update {
            StepUpdate::DocumentsVerified { value } => self.documents_verified = *value,
            StepUpdate::LegalCompliance { law_id, value } => {
                let entry = self
                    .legal_compliance
                    .get_mut(law_id)
                    .ok_or_else(|| ChecklistError::UnknownLaw {
                        law_id: law_id.clone(),
                    })?;
                *entry = *value;
            }
            StepUpdate::TechnicalValidation { value } => self.technical_validation = *value,
            StepUpdate::Decision { value } => self.decision = *value,
        }
        Ok(())
    }

    pub fn is_compliant(&self, law_id: &LawId) -> bool {
        self.legal_compliance.get(law_id).copied().unwrap_or(false)
    }

    /// True when the map holds exactly the ids of `laws`
    pub fn matches_laws(&self, laws: &[Law]) -> bool {
        self.legal_compliance.len() == laws.len()
            && laws.iter().all(|l| self.legal_compliance.contains_key(&l.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laws() -> Vec<Law> {
        vec![
            Law::mandatory("LAW-28-00", "Gestion des déchets"),
            Law::optional("ISO-14001", "Système de management environnemental"),
        ]
    }

    #[test]
    fn test_checklist_initializes_every_law_false() {
        let checklist = ValidationChecklist::for_laws(&laws()).unwrap();
        assert_eq!(checklist.legal_compliance.len(), 2);
        assert!(checklist.legal_compliance.values().all(|v| !v));
        assert!(checklist.matches_laws(&laws()));
        assert_eq!(checklist.decision, Decision::Unset);
    }

    #[test]
    fn test_duplicate_law_ids_rejected() {
        let mut list = laws();
        list.push(Law::optional("LAW-28-00", "duplicate"));
        assert_eq!(
            ValidationChecklist::for_laws(&list),
            Err(ChecklistError::DuplicateLaw {
                law_id: LawId::from("LAW-28-00")
            })
        );
    }

    #[test]
    fn test_unknown_law_update_leaves_checklist_untouched() {
        let mut checklist = ValidationChecklist::for_laws(&laws()).unwrap();
        let before = checklist.clone();
        let err = checklist
            .apply(&StepUpdate::LegalCompliance {
                law_id: LawId::from("LAW-99-99"),
                value: true,
            })
            .unwrap_err();
        assert!(matches!(err, ChecklistError::UnknownLaw { .. }));
        assert_eq!(checklist, before);
    }

    #[test]
    fn test_step_parsing_accepts_index_and_name() {
        assert_eq!("2".parse::<ValidationStep>(), Ok(ValidationStep::LegalCompliance));
        assert_eq!(
            "technical_validation".parse::<ValidationStep>(),
            Ok(ValidationStep::TechnicalValidation)
        );
        assert!("5".parse::<ValidationStep>().is_err());
    }

    #[test]
    fn test_step_predecessors() {
        let before: Vec<_> = ValidationStep::TechnicalValidation.predecessors().collect();
        assert_eq!(
            before,
            vec![ValidationStep::DocumentsVerified, ValidationStep::LegalCompliance]
        );
        assert_eq!(ValidationStep::DocumentsVerified.predecessors().count(), 0);
    }

    #[test]
    fn test_step_update_wire_format() {
        let update: StepUpdate = serde_json::from_str(
            r#"{"step":"legal_compliance","law_id":"LAW-28-00","value":true}"#,
        )
        .unwrap();
        assert_eq!(
            update,
            StepUpdate::LegalCompliance {
                law_id: LawId::from("LAW-28-00"),
                value: true
            }
        );
        assert_eq!(update.step(), ValidationStep::LegalCompliance);
    }
}
