//! Object storage abstraction.
//!
//! Uploaded files live in an external object store. Callers depend only on
//! [`StorageProvider`]; the concrete provider is picked from configuration
//! at startup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Errors returned by storage providers.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage provider not configured: {0}")]
    NotConfigured(String),

    #[error("Storage request failed: {0}")]
    Http(String),

    #[error("Storage provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Capability interface over an object store.
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Stores `data` at `path` and returns a locator for the stored object.
    async fn upload_file(
        &self,
        data: &[u8],
        content_type: &str,
        path: &str,
    ) -> Result<String, StorageError>;

    /// Removes an object, given the locator returned by [`upload_file`] or
    /// its raw path.
    ///
    /// [`upload_file`]: StorageProvider::upload_file
    async fn delete_file(&self, locator: &str) -> Result<(), StorageError>;
}

const MEMORY_SCHEME: &str = "memory://";

/// In-process object store for development and tests.
///
/// Failures can be switched on to exercise error paths.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    upload_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map is still structurally valid.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait::async_trait]
impl StorageProvider for InMemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn upload_file(
        &self,
        data: &[u8],
        _content_type: &str,
        path: &str,
    ) -> Result<String, StorageError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Http("simulated upload failure".to_string()));
        }

        self.lock().insert(path.to_string(), data.to_vec());
        tracing::debug!(path = %path, size = data.len(), "Stored object in memory");
        Ok(format!("{}{}", MEMORY_SCHEME, path))
    }

    async fn delete_file(&self, locator: &str) -> Result<(), StorageError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let path = locator.strip_prefix(MEMORY_SCHEME).unwrap_or(locator);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Http("simulated delete failure".to_string()));
        }

        match self.lock().remove(path) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }
}
