// Advisory technical forms shown during technical validation

use serde::{Deserialize, Serialize};

use crate::request::TreatmentType;

/// Kind of input a dynamic form field expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Date,
    File,
    Select,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Technical form attached to a treatment type. Advisory only: shown to the
/// reviewer during technical validation, never evaluated by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicForm {
    pub treatment_type: TreatmentType,
    pub fields: Vec<FormField>,
}
