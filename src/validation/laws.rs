// Legal references that make up the compliance step of a review

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a law in the catalog (e.g. `LAW-28-00`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LawId(pub String);

impl LawId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LawId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A law applicable to a treatment type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Law {
    pub id: LawId,
    pub is_mandatory: bool,
    /// Official reference, e.g. "Loi n° 28-00, art. 29"
    pub reference: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Law {
    pub fn mandatory(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: LawId::new(id),
            is_mandatory: true,
            reference: String::new(),
            title: title.into(),
            description: String::new(),
        }
    }

    pub fn optional(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            is_mandatory: false,
            ..Self::mandatory(id, title)
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }
}
