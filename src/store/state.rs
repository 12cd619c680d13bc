// Store contents and the mutation rules shared by every store backend

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::traits::{Commit, StoreError};
use crate::request::{CertificationRequest, RequestId, RequestStatus};
use crate::validation::ReviewRecord;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    requests: HashMap<RequestId, CertificationRequest>,
    reviews: HashMap<RequestId, ReviewRecord>,
}

impl StoreState {
    pub fn get_request(&self, request_id: &RequestId) -> Result<CertificationRequest, StoreError> {
        self.requests
            .get(request_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                request_id: *request_id,
            })
    }

    pub fn insert_request(
        &mut self,
        mut request: CertificationRequest,
    ) -> Result<CertificationRequest, StoreError> {
        if self.requests.contains_key(&request.id) {
            return Err(StoreError::AlreadyExists {
                request_id: request.id,
            });
        }
        request.version = 0;
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    pub fn commit(&mut self, commit: Commit) -> Result<CertificationRequest, StoreError> {
        let Commit {
            mut request,
            expected_version,
            review,
        } = commit;

        let stored = self.requests.get(&request.id).ok_or(StoreError::NotFound {
            request_id: request.id,
        })?;
        if stored.version != expected_version {
            return Err(StoreError::ConcurrentConflict {
                request_id: request.id,
                expected_version,
                found_version: stored.version,
            });
        }
        if let Some(review) = &review {
            if review.request_id != request.id {
                return Err(StoreError::ReviewMismatch {
                    request_id: request.id,
                });
            }
        }

        // Payment status belongs to the payment service, never to the commit
        request.has_payment = stored.has_payment;
        request.version = expected_version + 1;
        self.requests.insert(request.id, request.clone());
        if let Some(review) = review {
            self.reviews.insert(review.request_id, review);
        }
        Ok(request)
    }

    pub fn get_review(&self, request_id: &RequestId) -> Option<ReviewRecord> {
        self.reviews.get(request_id).cloned()
    }

    /// Checklist edits are only accepted while the request is under review and
    /// its stored review is still open
    pub fn save_review(&mut self, review: ReviewRecord) -> Result<(), StoreError> {
        let request = self
            .requests
            .get(&review.request_id)
            .ok_or(StoreError::NotFound {
                request_id: review.request_id,
            })?;
        let stored_open = self
            .reviews
            .get(&review.request_id)
            .map_or(true, ReviewRecord::is_open);
        if request.status != RequestStatus::UnderReview || !stored_open || !review.is_open() {
            return Err(StoreError::ReviewClosed {
                request_id: review.request_id,
                status: request.status,
            });
        }
        self.reviews.insert(review.request_id, review);
        Ok(())
    }

    pub fn find_successor(&self, request_id: &RequestId) -> Option<RequestId> {
        self.requests
            .values()
            .find(|r| r.predecessor.as_ref() == Some(request_id))
            .map(|r| r.id)
    }

    /// Requests ordered by creation time
    pub fn list_requests(&self, status: Option<RequestStatus>) -> Vec<CertificationRequest> {
        let mut requests: Vec<_> = self
            .requests
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by_key(|r| (r.created_at, r.id));
        requests
    }

    pub fn record_payment(&mut self, request_id: &RequestId) -> Result<(), StoreError> {
        let request = self
            .requests
            .get_mut(request_id)
            .ok_or(StoreError::NotFound {
                request_id: *request_id,
            })?;
        request.has_payment = true;
        Ok(())
    }

    pub fn to_snapshot(&self) -> StoreSnapshot {
        let requests = self.list_requests(None);
        let mut reviews: Vec<_> = self.reviews.values().cloned().collect();
        reviews.sort_by_key(|r| (r.started_at, r.request_id));
        StoreSnapshot {
            format_version: FORMAT_VERSION,
            requests,
            reviews,
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        if snapshot.format_version != FORMAT_VERSION {
            return Err(StoreError::Corrupted {
                reason: format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    snapshot.format_version
                ),
            });
        }
        let mut state = Self::default();
        for request in snapshot.requests {
            if state.requests.insert(request.id, request).is_some() {
                return Err(StoreError::Corrupted {
                    reason: "duplicate request id".to_string(),
                });
            }
        }
        for review in snapshot.reviews {
            if !state.requests.contains_key(&review.request_id) {
                return Err(StoreError::Corrupted {
                    reason: format!("review for unknown request {}", review.request_id),
                });
            }
            state.reviews.insert(review.request_id, review);
        }
        Ok(state)
    }
}

/// On-disk representation of a store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub format_version: u32,
    pub requests: Vec<CertificationRequest>,
    pub reviews: Vec<ReviewRecord>,
}
