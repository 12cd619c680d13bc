use async_trait::async_trait;
use tokio::sync::Mutex;

use super::state::StoreState;
use super::traits::{Commit, RequestStore, StoreError};
use crate::request::{CertificationRequest, RequestId, RequestStatus};
use crate::validation::ReviewRecord;

/// Process-local store; contents are lost when dropped
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn get_request(
        &self,
        request_id: &RequestId,
    ) -> Result<CertificationRequest, StoreError> {
        self.state.lock().await.get_request(request_id)
    }

    async fn insert_request(
        &self,
        request: CertificationRequest,
    ) -> Result<CertificationRequest, StoreError> {
        self.state.lock().await.insert_request(request)
    }

    async fn commit(&self, commit: Commit) -> Result<CertificationRequest, StoreError> {
        self.state.lock().await.commit(commit)
    }

    async fn get_review(&self, request_id: &RequestId) -> Result<Option<ReviewRecord>, StoreError> {
        Ok(self.state.lock().await.get_review(request_id))
    }

    async fn save_review(&self, review: ReviewRecord) -> Result<(), StoreError> {
        self.state.lock().await.save_review(review)
    }

    async fn find_successor(&self, request_id: &RequestId) -> Result<Option<RequestId>, StoreError> {
        Ok(self.state.lock().await.find_successor(request_id))
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<CertificationRequest>, StoreError> {
        Ok(self.state.lock().await.list_requests(status))
    }

    async fn record_payment(&self, request_id: &RequestId) -> Result<(), StoreError> {
        self.state.lock().await.record_payment(request_id)
    }
}
