// Local certificate issuer and rejection reporter
//
// Both mint ids derived from the request id and the issue date, so repeating a
// signal for the same request on the same day yields the same document.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use super::traits::{
    CertificateId, CertificateIssuer, CollaboratorError, RejectionReporter, ReportId,
};
use crate::request::RequestId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub request_id: RequestId,
    pub issued_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl Certificate {
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.issued_at && at < self.valid_until
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReport {
    pub id: ReportId,
    pub request_id: RequestId,
    pub reason: String,
    pub generated_at: DateTime<Utc>,
}

pub fn certificate_number(request_id: &RequestId, at: DateTime<Utc>) -> CertificateId {
    CertificateId(format!("CERT-{}-{}", at.format("%Y%m%d"), request_id.short()))
}

pub fn report_number(request_id: &RequestId, at: DateTime<Utc>) -> ReportId {
    ReportId(format!("RPT-{}-{}", at.format("%Y%m%d"), request_id.short()))
}

/// Issues certificates in-process and keeps the records in memory
#[derive(Debug)]
pub struct LocalCertificateIssuer {
    validity: Duration,
    issued: Mutex<Vec<Certificate>>,
}

impl LocalCertificateIssuer {
    pub fn new(validity_days: u32) -> Self {
        Self {
            validity: Duration::days(i64::from(validity_days)),
            issued: Mutex::new(Vec::new()),
        }
    }

    pub async fn certificates(&self) -> Vec<Certificate> {
        self.issued.lock().await.clone()
    }

    pub async fn certificate_for(&self, request_id: &RequestId) -> Option<Certificate> {
        self.issued
            .lock()
            .await
            .iter()
            .find(|c| &c.request_id == request_id)
            .cloned()
    }
}

#[async_trait]
impl CertificateIssuer for LocalCertificateIssuer {
    async fn issue_certificate(
        &self,
        request_id: RequestId,
    ) -> Result<CertificateId, CollaboratorError> {
        let mut issued = self.issued.lock().await;
        if let Some(existing) = issued.iter().find(|c| c.request_id == request_id) {
            return Ok(existing.id.clone());
        }

        let now = Utc::now();
        let certificate = Certificate {
            id: certificate_number(&request_id, now),
            request_id,
            issued_at: now,
            valid_until: now + self.validity,
        };
        info!(
            request_id = %request_id,
            certificate_id = %certificate.id,
            valid_until = %certificate.valid_until,
            "Certificate issued"
        );
        let id = certificate.id.clone();
        issued.push(certificate);
        Ok(id)
    }
}

/// Generates rejection reports in-process and keeps them in memory
#[derive(Debug, Default)]
pub struct LocalRejectionReporter {
    reports: Mutex<Vec<RejectionReport>>,
}

impl LocalRejectionReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reports(&self) -> Vec<RejectionReport> {
        self.reports.lock().await.clone()
    }
}

#[async_trait]
impl RejectionReporter for LocalRejectionReporter {
    async fn generate_rejection_report(
        &self,
        request_id: RequestId,
        reason: &str,
    ) -> Result<ReportId, CollaboratorError> {
        let now = Utc::now();
        let report = RejectionReport {
            id: report_number(&request_id, now),
            request_id,
            reason: reason.to_string(),
            generated_at: now,
        };
        info!(request_id = %request_id, report_id = %report.id, "Rejection report generated");
        let id = report.id.clone();
        self.reports.lock().await.push(report);
        Ok(id)
    }
}
