//! In-memory object store that records every call.

use async_trait::async_trait;
use lfsgate_storage::error::{StorageError, StorageResult};
use lfsgate_storage::traits::{ObjectStore, PresignMethod, PresignedUrl};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Base URL of issued fake presigned URLs.
#[allow(dead_code)]
pub const STORAGE_BASE_URL: &str = "https://storage.test";

/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingStore {
    existing: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    exists_calls: Mutex<Vec<String>>,
    presign_calls: Mutex<Vec<(PresignMethod, String)>>,
    exists_broken: Mutex<bool>,
    presign_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an object key as already stored.
    pub fn insert(&self, key: &str) {
        self.existing.lock().unwrap().insert(key.to_string());
    }

    /// Make presigning fail for a key.
    pub fn fail_presign(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    /// Make every existence check fail.
    pub fn break_exists(&self) {
        *self.exists_broken.lock().unwrap() = true;
    }

    /// Delay every presign call.
    pub fn delay_presign(&self, delay: Duration) {
        *self.presign_delay.lock().unwrap() = Some(delay);
    }

    pub fn exists_calls(&self) -> Vec<String> {
        self.exists_calls.lock().unwrap().clone()
    }

    pub fn presign_calls(&self) -> Vec<(PresignMethod, String)> {
        self.presign_calls.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.exists_calls.lock().unwrap().push(key.to_string());
        if *self.exists_broken.lock().unwrap() {
            return Err(StorageError::Config("exists unavailable".to_string()));
        }
        Ok(self.existing.lock().unwrap().contains(key))
    }

    async fn presign(
        &self,
        method: PresignMethod,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedUrl> {
        self.presign_calls
            .lock()
            .unwrap()
            .push((method, key.to_string()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.presign_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(key) {
            return Err(StorageError::Presign(format!("refusing to sign {key}")));
        }

        let mut headers = BTreeMap::new();
        if method == PresignMethod::Put {
            headers.insert("x-amz-acl".to_string(), "private".to_string());
        }
        Ok(PresignedUrl {
            url: format!(
                "{STORAGE_BASE_URL}/{key}?X-Amz-Method={method}&X-Amz-Expires={}&X-Amz-Signature=test",
                expires_in.as_secs()
            ),
            headers,
            expires_in,
        })
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}
