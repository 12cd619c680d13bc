use async_trait::async_trait;
use thiserror::Error;

use crate::request::{CertificationRequest, RequestId, RequestStatus};
use crate::validation::ReviewRecord;

/// Errors that can be returned by a request store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer committed the request since it was read
    #[error("concurrent conflict on request {request_id}: expected version {expected_version}, found {found_version}")]
    ConcurrentConflict {
        request_id: RequestId,
        expected_version: u64,
        found_version: u64,
    },

    #[error("request not found: {request_id}")]
    NotFound { request_id: RequestId },

    #[error("request already exists: {request_id}")]
    AlreadyExists { request_id: RequestId },

    /// The review can no longer be edited
    #[error("review for request {request_id} is closed (status {status})")]
    ReviewClosed {
        request_id: RequestId,
        status: RequestStatus,
    },

    #[error("review for request {request_id} does not match the stored review")]
    ReviewMismatch { request_id: RequestId },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("State corruption detected: {reason}")]
    Corrupted { reason: String },
}

/// A request change persisted in one atomic step together with its review
#[derive(Debug, Clone)]
pub struct Commit {
    /// The new request state; its `version` field is ignored and reassigned
    pub request: CertificationRequest,
    /// Version the change was computed from
    pub expected_version: u64,
    pub review: Option<ReviewRecord>,
}

/// Durable storage of requests and their reviews.
///
/// Every mutation is atomic: either all of a commit is visible or none of it.
/// `commit` applies an optimistic concurrency check against `expected_version`
/// and bumps the stored version by one.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn get_request(&self, request_id: &RequestId)
        -> Result<CertificationRequest, StoreError>;

    /// Insert a brand new request at version 0
    async fn insert_request(
        &self,
        request: CertificationRequest,
    ) -> Result<CertificationRequest, StoreError>;

    async fn commit(&self, commit: Commit) -> Result<CertificationRequest, StoreError>;

    async fn get_review(&self, request_id: &RequestId) -> Result<Option<ReviewRecord>, StoreError>;

    /// Persist a checklist change. Does not touch the request.
    ///
    /// Fails with [`StoreError::ReviewClosed`] once the request has left
    /// `under_review` or its review was closed.
    async fn save_review(&self, review: ReviewRecord) -> Result<(), StoreError>;

    /// The request created by resubmitting `request_id`, if any
    async fn find_successor(&self, request_id: &RequestId) -> Result<Option<RequestId>, StoreError>;

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<CertificationRequest>, StoreError>;

    /// Entry point for the payment service. The workflow itself never calls this.
    async fn record_payment(&self, request_id: &RequestId) -> Result<(), StoreError>;
}
