// Workflow orchestrator - the only mutation surface for certification requests
//
// Each operation runs under the request's lock, computes the next request and
// review state from what is stored, and persists both in one commit. Nothing is
// written when any check fails.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::errors::{ValidationError, WorkflowError};
use super::locks::RequestLocks;
use crate::config::WorkflowConfig;
use crate::external::{
    CertificateId, CertificateIssuer, CollaboratorError, FormCatalog, LawCatalog,
    RejectionReporter, ReportId,
};
use crate::request::lifecycle::{initial_status, next_status};
use crate::request::{
    Actor, ActorId, CertificationRequest, Decision, Operation, RequestId, RequestPayload,
    RequestStatus, Role, TransitionRecord, TreatmentType,
};
use crate::store::{Commit, RequestStore};
use crate::validation::{
    GateReport, ReviewRecord, StepUpdate, ValidationChecklist, ValidationStep,
};

const LAW_CATALOG: &str = "law catalog";
const FORM_CATALOG: &str = "form catalog";
const CERTIFICATE_ISSUER: &str = "certificate issuer";
const REJECTION_REPORTER: &str = "rejection reporter";

/// External services the workflow signals or queries
#[derive(Clone)]
pub struct Collaborators {
    pub laws: Arc<dyn LawCatalog>,
    pub forms: Arc<dyn FormCatalog>,
    pub certificates: Arc<dyn CertificateIssuer>,
    pub rejections: Arc<dyn RejectionReporter>,
}

/// Result of a successful approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub request: CertificationRequest,
    /// `None` when the issuer failed after the approval was committed
    pub certificate_id: Option<CertificateId>,
}

/// Result of a successful rejection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionOutcome {
    pub request: CertificationRequest,
    /// `None` when report generation failed after the rejection was committed
    pub report_id: Option<ReportId>,
}

pub struct WorkflowOrchestrator {
    store: Arc<dyn RequestStore>,
    collaborators: Collaborators,
    locks: RequestLocks,
    collaborator_timeout: Duration,
}

impl WorkflowOrchestrator {
    pub fn new(
        store: Arc<dyn RequestStore>,
        collaborators: Collaborators,
        config: &WorkflowConfig,
    ) -> Self {
        Self {
            store,
            collaborators,
            locks: RequestLocks::new(config.lock_stripes),
            collaborator_timeout: config.collaborator_timeout(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RequestStore> {
        &self.store
    }

    // ── Creation ─────────────────────────────────────────────────────────────

    /// Create a request in `draft`; the payload may still be incomplete
    #[instrument(skip_all, fields(requester = %requester.id, %treatment_type))]
    pub async fn create_draft(
        &self,
        requester: &Actor,
        treatment_type: TreatmentType,
        payload: RequestPayload,
    ) -> Result<CertificationRequest, WorkflowError> {
        self.create(requester, treatment_type, payload, Operation::CreateDraft)
            .await
    }

    /// Create a request directly in `submitted`
    #[instrument(skip_all, fields(requester = %requester.id, %treatment_type))]
    pub async fn submit_new(
        &self,
        requester: &Actor,
        treatment_type: TreatmentType,
        payload: RequestPayload,
    ) -> Result<CertificationRequest, WorkflowError> {
        self.create(requester, treatment_type, payload, Operation::SubmitNew)
            .await
    }

    async fn create(
        &self,
        requester: &Actor,
        treatment_type: TreatmentType,
        payload: RequestPayload,
        operation: Operation,
    ) -> Result<CertificationRequest, WorkflowError> {
        if !matches!(requester.role, Role::Enterprise | Role::Admin) {
            return Err(WorkflowError::Unauthorized {
                actor: requester.id.clone(),
                operation,
                reason: "only enterprises create certification requests".to_string(),
            });
        }
        check_documents(&payload)?;

        let status = initial_status(operation).map_err(|e| {
            ValidationError::new("operation", e.to_string())
        })?;
        if status == RequestStatus::Submitted {
            check_submission(&payload)?;
        }

        let request = CertificationRequest::new(
            requester.id.clone(),
            treatment_type,
            payload,
            status,
            operation,
            Utc::now(),
        );
        let request = self.store.insert_request(request).await?;
        info!(request_id = %request.id, status = %request.status, "Certification request created");
        Ok(request)
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// draft -> submitted
    #[instrument(skip_all, fields(%request_id, actor = %actor.id))]
    pub async fn submit(
        &self,
        request_id: &RequestId,
        actor: &Actor,
    ) -> Result<CertificationRequest, WorkflowError> {
        let _guard = self.locks.acquire(request_id).await;
        let request = self.store.get_request(request_id).await?;
        let next = transition(&request, Operation::Submit, Some(&actor.id), None)?;
        ensure_requester(&request, actor, Operation::Submit)?;
        check_documents(&request.payload)?;
        check_submission(&request.payload)?;

        let committed = self.commit(&request, next, None).await?;
        info!(request_id = %request_id, "Request submitted");
        Ok(committed)
    }

    /// submitted -> under_review, with the caller as assignee and a fresh checklist
    #[instrument(skip_all, fields(%request_id, actor = %actor.id))]
    pub async fn assign_to_me(
        &self,
        request_id: &RequestId,
        actor: &Actor,
    ) -> Result<CertificationRequest, WorkflowError> {
        let _guard = self.locks.acquire(request_id).await;
        let request = self.store.get_request(request_id).await?;
        let mut next = transition(&request, Operation::AssignToMe, Some(&actor.id), None)?;

        if !actor.role.can_review() {
            return Err(WorkflowError::Unauthorized {
                actor: actor.id.clone(),
                operation: Operation::AssignToMe,
                reason: "reviewer capability required".to_string(),
            });
        }
        if let Some(assignee) = &request.assignee {
            warn!(request_id = %request_id, %assignee, "Submitted request already carries an assignee");
            return Err(invalid(&request, Operation::AssignToMe));
        }
        if !request.has_payment {
            info!(request_id = %request_id, "Review started before payment was received");
        }

        let review = self.open_review(&request, actor.id.clone()).await?;
        next.assignee = Some(actor.id.clone());

        let committed = self.commit(&request, next, Some(review)).await?;
        info!(request_id = %request_id, assignee = %actor.id, "Request assigned for review");
        Ok(committed)
    }

    /// Record one checklist field. Never changes the request status.
    #[instrument(skip_all, fields(%request_id, step = %update.step()))]
    pub async fn record_step(
        &self,
        request_id: &RequestId,
        update: StepUpdate,
    ) -> Result<ReviewRecord, WorkflowError> {
        let _guard = self.locks.acquire(request_id).await;
        let request = self.store.get_request(request_id).await?;
        ensure_under_review(&request)?;

        let review = match self.store.get_review(request_id).await? {
            Some(review) => review,
            None => self.review_for(&request).await?,
        };
        let updated = review.with_update(&update, Utc::now())?;
        self.store.save_review(updated.clone()).await?;
        Ok(updated)
    }

    /// under_review -> approved, then signal certificate issuance
    pub async fn approve_and_generate(
        &self,
        request_id: &RequestId,
    ) -> Result<ApprovalOutcome, WorkflowError> {
        self.approve_with_comments(request_id, None).await
    }

    #[instrument(skip_all, fields(%request_id))]
    pub async fn approve_with_comments(
        &self,
        request_id: &RequestId,
        comments: Option<&str>,
    ) -> Result<ApprovalOutcome, WorkflowError> {
        let comments = comments
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let committed = {
            let _guard = self.locks.acquire(request_id).await;
            let request = self.store.get_request(request_id).await?;
            let mut next = transition(
                &request,
                Operation::ApproveAndGenerate,
                request.assignee.as_ref(),
                comments.clone(),
            )?;

            let review = match self.store.get_review(request_id).await? {
                Some(review) => review,
                // Nothing recorded yet: evaluate an empty checklist, persist nothing
                None => self.review_for(&request).await?,
            };
            review
                .gate()
                .check_approval()
                .map_err(|gate| WorkflowError::GateNotSatisfied {
                    request_id: *request_id,
                    gate,
                })?;

            if !request.has_payment {
                warn!(request_id = %request_id, "Approving request without recorded payment");
            }
            next.decision_comments = comments;
            let closed = review.closed(Some(Decision::Approve), next.updated_at);
            self.commit(&request, next, Some(closed)).await?
        };
        info!(request_id = %request_id, "Request approved");

        let certificate_id = match self
            .call(
                CERTIFICATE_ISSUER,
                self.collaborators.certificates.issue_certificate(*request_id),
            )
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Certificate issuance failed after approval");
                None
            }
        };

        Ok(ApprovalOutcome {
            request: committed,
            certificate_id,
        })
    }

    /// under_review -> rejected, then signal the rejection report
    #[instrument(skip_all, fields(%request_id))]
    pub async fn reject(
        &self,
        request_id: &RequestId,
        reason: &str,
    ) -> Result<RejectionOutcome, WorkflowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::new("reason", "rejection reason must not be empty").into());
        }

        let committed = {
            let _guard = self.locks.acquire(request_id).await;
            let request = self.store.get_request(request_id).await?;
            let mut next = transition(
                &request,
                Operation::Reject,
                request.assignee.as_ref(),
                Some(reason.to_string()),
            )?;
            next.decision_comments = Some(reason.to_string());

            let closed = self
                .store
                .get_review(request_id)
                .await?
                .map(|review| review.closed(Some(Decision::Reject), next.updated_at));
            self.commit(&request, next, closed).await?
        };
        info!(request_id = %request_id, "Request rejected");

        let report_id = match self
            .call(
                REJECTION_REPORTER,
                self.collaborators
                    .rejections
                    .generate_rejection_report(*request_id, reason),
            )
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Rejection report generation failed");
                None
            }
        };

        Ok(RejectionOutcome {
            request: committed,
            report_id,
        })
    }

    /// Create a new submitted request from a rejected one. The original is not modified.
    #[instrument(skip_all, fields(%original_id))]
    pub async fn resubmit(
        &self,
        original_id: &RequestId,
        new_payload: RequestPayload,
    ) -> Result<CertificationRequest, WorkflowError> {
        check_documents(&new_payload)?;
        check_submission(&new_payload)?;

        let _guard = self.locks.acquire(original_id).await;
        let original = self.store.get_request(original_id).await?;
        let status = next_status(original.status, Operation::Resubmit)
            .map_err(|_| invalid(&original, Operation::Resubmit))?;
        if let Some(successor) = self.store.find_successor(original_id).await? {
            return Err(WorkflowError::AlreadyResubmitted {
                original: *original_id,
                successor,
            });
        }

        let mut request = CertificationRequest::new(
            original.requester.clone(),
            original.treatment_type,
            new_payload,
            status,
            Operation::Resubmit,
            Utc::now(),
        );
        request.predecessor = Some(*original_id);
        if let Some(first) = request.history.first_mut() {
            first.comment = Some(format!("resubmission of {original_id}"));
        }

        let request = self.store.insert_request(request).await?;
        info!(original_id = %original_id, request_id = %request.id, "Rejected request resubmitted");
        Ok(request)
    }

    /// Requester-initiated cancellation from any open status
    #[instrument(skip_all, fields(%request_id, actor = %actor.id))]
    pub async fn cancel(
        &self,
        request_id: &RequestId,
        actor: &Actor,
    ) -> Result<CertificationRequest, WorkflowError> {
        let _guard = self.locks.acquire(request_id).await;
        let request = self.store.get_request(request_id).await?;
        let next = transition(&request, Operation::Cancel, Some(&actor.id), None)?;
        ensure_requester(&request, actor, Operation::Cancel)?;

        let closed = self
            .store
            .get_review(request_id)
            .await?
            .filter(ReviewRecord::is_open)
            .map(|review| review.closed(None, next.updated_at));
        let committed = self.commit(&request, next, closed).await?;
        info!(request_id = %request_id, "Request cancelled");
        Ok(committed)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub async fn get_request(
        &self,
        request_id: &RequestId,
    ) -> Result<CertificationRequest, WorkflowError> {
        Ok(self.store.get_request(request_id).await?)
    }

    pub async fn get_status(&self, request_id: &RequestId) -> Result<RequestStatus, WorkflowError> {
        Ok(self.store.get_request(request_id).await?.status)
    }

    pub async fn history(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<TransitionRecord>, WorkflowError> {
        Ok(self.store.get_request(request_id).await?.history)
    }

    pub async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<CertificationRequest>, WorkflowError> {
        Ok(self.store.list_requests(status).await?)
    }

    /// Review of a request. A request under review without a stored review gets
    /// one initialized and persisted on this first access.
    pub async fn get_review(&self, request_id: &RequestId) -> Result<ReviewRecord, WorkflowError> {
        if let Some(review) = self.store.get_review(request_id).await? {
            return Ok(review);
        }

        let _guard = self.locks.acquire(request_id).await;
        let request = self.store.get_request(request_id).await?;
        ensure_under_review(&request)?;
        self.current_or_new_review(&request).await
    }

    pub async fn get_checklist(
        &self,
        request_id: &RequestId,
    ) -> Result<ValidationChecklist, WorkflowError> {
        Ok(self.get_review(request_id).await?.checklist)
    }

    pub async fn gate_report(&self, request_id: &RequestId) -> Result<GateReport, WorkflowError> {
        Ok(self.get_review(request_id).await?.gate().report())
    }

    pub async fn can_approve(&self, request_id: &RequestId) -> Result<bool, WorkflowError> {
        Ok(self.get_review(request_id).await?.gate().can_approve())
    }

    pub async fn is_step_complete(
        &self,
        request_id: &RequestId,
        step: ValidationStep,
    ) -> Result<bool, WorkflowError> {
        Ok(self.get_review(request_id).await?.gate().is_step_complete(step))
    }

    // ── Internals ────────────────────────────────────────────────────────────

    async fn commit(
        &self,
        current: &CertificationRequest,
        next: CertificationRequest,
        review: Option<ReviewRecord>,
    ) -> Result<CertificationRequest, WorkflowError> {
        Ok(self
            .store
            .commit(Commit {
                request: next,
                expected_version: current.version,
                review,
            })
            .await?)
    }

    /// Caller must hold the request lock
    async fn current_or_new_review(
        &self,
        request: &CertificationRequest,
    ) -> Result<ReviewRecord, WorkflowError> {
        if let Some(review) = self.store.get_review(&request.id).await? {
            return Ok(review);
        }
        let review = self.review_for(request).await?;
        self.store.save_review(review.clone()).await?;
        info!(request_id = %request.id, "Review initialized on first access");
        Ok(review)
    }

    /// Unsaved review for the request's assignee
    async fn review_for(&self, request: &CertificationRequest) -> Result<ReviewRecord, WorkflowError> {
        let reviewer = request.assignee.clone().ok_or_else(|| {
            ValidationError::new("assignee", "request under review has no assignee")
        })?;
        self.open_review(request, reviewer).await
    }

    async fn open_review(
        &self,
        request: &CertificationRequest,
        reviewer: ActorId,
    ) -> Result<ReviewRecord, WorkflowError> {
        let laws = self
            .call(
                LAW_CATALOG,
                self.collaborators
                    .laws
                    .laws_for_treatment_type(request.treatment_type),
            )
            .await?;

        // The form is advisory; review proceeds without it
        let form = match self
            .call(
                FORM_CATALOG,
                self.collaborators
                    .forms
                    .form_for_treatment_type(request.treatment_type),
            )
            .await
        {
            Ok(form) => form,
            Err(e) => {
                warn!(request_id = %request.id, error = %e, "Technical form unavailable");
                None
            }
        };

        Ok(ReviewRecord::open(request.id, reviewer, laws, form, Utc::now())?)
    }

    async fn call<T>(
        &self,
        service: &'static str,
        fut: impl Future<Output = Result<T, CollaboratorError>>,
    ) -> Result<T, WorkflowError> {
        match tokio::time::timeout(self.collaborator_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(WorkflowError::Collaborator { service, source }),
            Err(_) => Err(WorkflowError::CollaboratorTimeout {
                service,
                timeout_ms: self.collaborator_timeout.as_millis() as u64,
            }),
        }
    }
}

fn invalid(request: &CertificationRequest, operation: Operation) -> WorkflowError {
    WorkflowError::InvalidTransition {
        request_id: request.id,
        current: request.status,
        operation,
    }
}

/// Copy of `request` moved along `operation`, with the audit record appended
fn transition(
    request: &CertificationRequest,
    operation: Operation,
    actor: Option<&ActorId>,
    comment: Option<String>,
) -> Result<CertificationRequest, WorkflowError> {
    let to = next_status(request.status, operation).map_err(|_| invalid(request, operation))?;
    let now = Utc::now();
    let mut next = request.clone();
    next.history.push(TransitionRecord {
        from: Some(request.status),
        to,
        operation,
        actor: actor.cloned(),
        comment,
        at: now,
    });
    next.status = to;
    next.updated_at = now;
    Ok(next)
}

fn ensure_under_review(request: &CertificationRequest) -> Result<(), WorkflowError> {
    if request.status == RequestStatus::UnderReview {
        Ok(())
    } else {
        Err(WorkflowError::NotUnderReview {
            request_id: request.id,
            current: request.status,
        })
    }
}

fn ensure_requester(
    request: &CertificationRequest,
    actor: &Actor,
    operation: Operation,
) -> Result<(), WorkflowError> {
    if request.is_requester(&actor.id) {
        Ok(())
    } else {
        Err(WorkflowError::Unauthorized {
            actor: actor.id.clone(),
            operation,
            reason: "only the requesting enterprise may do this".to_string(),
        })
    }
}

fn check_documents(payload: &RequestPayload) -> Result<(), ValidationError> {
    match payload.malformed_documents().first() {
        None => Ok(()),
        Some(index) => Err(ValidationError::new(
            format!("documents[{index}]"),
            "document needs a name and a storage reference",
        )),
    }
}

fn check_submission(payload: &RequestPayload) -> Result<(), ValidationError> {
    let missing = payload.missing_for_submission();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(
            missing.join(", "),
            "required for submission",
        ))
    }
}
