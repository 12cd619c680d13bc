// JSON file store: the whole store lives in one document rewritten atomically

use async_trait::async_trait;
use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use super::state::{StoreSnapshot, StoreState};
use super::traits::{Commit, RequestStore, StoreError};
use crate::request::{CertificationRequest, RequestId, RequestStatus};
use crate::validation::ReviewRecord;

/// File-backed store shared by every process pointing at the same path.
///
/// Each call takes an advisory lock on a sidecar `<state>.lock` file, reads the
/// document, applies the change and writes it back through a uniquely named
/// temporary file and a rename. Writers hold the exclusive lock across the
/// whole read-modify-write, so a commit always checks its version against the
/// latest durable state.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read<T>(
        &self,
        f: impl FnOnce(&StoreState) -> T + Send + 'static,
    ) -> Result<T, StoreError>
    where
        T: Send + 'static,
    {
        let path = self.path.clone();
        blocking(move || {
            let lock = RwLock::new(open_lock_file(&path)?);
            let _guard = lock.read()?;
            let state = load(&path)?;
            Ok(f(&state))
        })
        .await
    }

    async fn write<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError> + Send + 'static,
    ) -> Result<T, StoreError>
    where
        T: Send + 'static,
    {
        let path = self.path.clone();
        blocking(move || {
            let mut lock = RwLock::new(open_lock_file(&path)?);
            let _guard = lock.write()?;
            let mut state = load(&path)?;
            let out = f(&mut state)?;
            save(&path, &state)?;
            Ok(out)
        })
        .await
    }

    /// Create the state file if it does not exist yet
    pub async fn init(&self) -> Result<(), StoreError> {
        let path = self.path.clone();
        blocking(move || {
            let mut lock = RwLock::new(open_lock_file(&path)?);
            let _guard = lock.write()?;
            if path.try_exists()? {
                return Ok(());
            }
            save(&path, &StoreState::default())?;
            info!(path = %path.display(), "Initialized request store");
            Ok(())
        })
        .await
    }
}

async fn blocking<T>(
    f: impl FnOnce() -> Result<T, StoreError> + Send + 'static,
) -> Result<T, StoreError>
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

fn open_lock_file(path: &Path) -> Result<File, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path(path))?)
}

fn load(path: &Path) -> Result<StoreState, StoreError> {
    match fs::read(path) {
        Ok(bytes) => {
            let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)?;
            StoreState::from_snapshot(snapshot)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "State file missing, starting empty");
            Ok(StoreState::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn save(path: &Path, state: &StoreState) -> Result<(), StoreError> {
    let content = serde_json::to_vec_pretty(&state.to_snapshot())?;
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    let tmp = path.with_file_name(name);
    if let Err(e) = fs::write(&tmp, content).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl RequestStore for JsonFileStore {
    async fn get_request(
        &self,
        request_id: &RequestId,
    ) -> Result<CertificationRequest, StoreError> {
        let id = *request_id;
        self.read(move |s| s.get_request(&id)).await?
    }

    async fn insert_request(
        &self,
        request: CertificationRequest,
    ) -> Result<CertificationRequest, StoreError> {
        self.write(move |s| s.insert_request(request)).await
    }

    async fn commit(&self, commit: Commit) -> Result<CertificationRequest, StoreError> {
        self.write(move |s| s.commit(commit)).await
    }

    async fn get_review(&self, request_id: &RequestId) -> Result<Option<ReviewRecord>, StoreError> {
        let id = *request_id;
        self.read(move |s| s.get_review(&id)).await
    }

    async fn save_review(&self, review: ReviewRecord) -> Result<(), StoreError> {
        self.write(move |s| s.save_review(review)).await
    }

    async fn find_successor(&self, request_id: &RequestId) -> Result<Option<RequestId>, StoreError> {
        let id = *request_id;
        self.read(move |s| s.find_successor(&id)).await
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<CertificationRequest>, StoreError> {
        self.read(move |s| s.list_requests(status)).await
    }

    async fn record_payment(&self, request_id: &RequestId) -> Result<(), StoreError> {
        let id = *request_id;
        self.write(move |s| s.record_payment(&id)).await
    }
}
