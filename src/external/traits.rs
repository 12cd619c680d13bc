// Traits for dependency injection - the services the workflow consumes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::request::{RequestId, TreatmentType};
use crate::validation::{DynamicForm, Law};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(pub String);

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub String);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("{service} is unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },
    #[error("{service} refused the call: {message}")]
    Refused {
        service: &'static str,
        message: String,
    },
    #[error("no catalog entry for treatment type {treatment_type}")]
    UnknownTreatmentType { treatment_type: TreatmentType },
}

/// Lookup of the laws applicable to a treatment type
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait LawCatalog: Send + Sync {
    async fn laws_for_treatment_type(
        &self,
        treatment_type: TreatmentType,
    ) -> Result<Vec<Law>, CollaboratorError>;
}

/// Lookup of the advisory technical form for a treatment type
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait FormCatalog: Send + Sync {
    async fn form_for_treatment_type(
        &self,
        treatment_type: TreatmentType,
    ) -> Result<Option<DynamicForm>, CollaboratorError>;
}

/// Mints the certificate record for an approved request
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    async fn issue_certificate(&self, request_id: RequestId)
        -> Result<CertificateId, CollaboratorError>;
}

/// Produces the rejection report sent to the enterprise
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait RejectionReporter: Send + Sync {
    async fn generate_rejection_report(
        &self,
        request_id: RequestId,
        reason: &str,
    ) -> Result<ReportId, CollaboratorError>;
}
