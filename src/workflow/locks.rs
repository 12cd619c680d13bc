// Per-request serialization through lock striping

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::{Mutex, MutexGuard};

use crate::request::RequestId;

/// Fixed table of async mutexes indexed by request id hash.
///
/// Two operations on the same request always contend for the same stripe.
/// Operations on different requests only wait on each other when their ids
/// land in the same stripe.
#[derive(Debug)]
pub struct RequestLocks {
    stripes: Vec<Mutex<()>>,
}

impl RequestLocks {
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn stripe_of(&self, request_id: &RequestId) -> usize {
        let mut hasher = DefaultHasher::new();
        request_id.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    pub async fn acquire(&self, request_id: &RequestId) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_of(request_id)].lock().await
    }
}

impl Default for RequestLocks {
    fn default() -> Self {
        Self::new(64)
    }
}
