//! Mock Storage implementation for testing

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tripmedia_storage::{MemoryStorage, Storage, StorageBackend, StorageError, StorageResult};

/// In-memory storage that counts calls and can be told to fail or stall.
///
/// Put failures and delays are keyed on a prefix of the uploaded bytes, since
/// keys carry random tokens and are unknown to the test up front. Files whose
/// bytes are not a decodable image pass through compression untouched, so the
/// prefix seen here is the one the test supplied.
pub struct MockStorage {
    inner: MemoryStorage,
    put_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_all_puts: AtomicBool,
    fail_all_deletes: AtomicBool,
    fail_put_prefixes: Mutex<Vec<Vec<u8>>>,
    fail_delete_keys: Mutex<HashSet<String>>,
    put_delays: Mutex<Vec<(Vec<u8>, Duration)>>,
    completed_puts: Mutex<Vec<String>>,
    deleted_keys: Mutex<Vec<String>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            inner: MemoryStorage::new("https://storage.example.com"),
            put_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fail_all_puts: AtomicBool::new(false),
            fail_all_deletes: AtomicBool::new(false),
            fail_put_prefixes: Mutex::new(Vec::new()),
            fail_delete_keys: Mutex::new(HashSet::new()),
            put_delays: Mutex::new(Vec::new()),
            completed_puts: Mutex::new(Vec::new()),
            deleted_keys: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_all_puts(&self) {
        self.fail_all_puts.store(true, Ordering::SeqCst);
    }

    pub fn fail_all_deletes(&self) {
        self.fail_all_deletes.store(true, Ordering::SeqCst);
    }

    /// Fail every put whose payload starts with `prefix`.
    pub fn fail_puts_starting_with(&self, prefix: &[u8]) {
        self.fail_put_prefixes.lock().unwrap().push(prefix.to_vec());
    }

    pub fn fail_delete_of(&self, key: &str) {
        self.fail_delete_keys.lock().unwrap().insert(key.to_string());
    }

    /// Delay every put whose payload starts with `prefix`.
    pub fn delay_puts_starting_with(&self, prefix: &[u8], delay: Duration) {
        self.put_delays.lock().unwrap().push((prefix.to_vec(), delay));
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Keys of successful puts, in completion order.
    pub fn completed_puts(&self) -> Vec<String> {
        self.completed_puts.lock().unwrap().clone()
    }

    /// Keys of successful deletes, in completion order.
    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted_keys.lock().unwrap().clone()
    }

    /// Store a file directly, bypassing counters.
    pub async fn set_file(&self, key: &str, data: &[u8]) {
        self.inner
            .put(key, Bytes::copy_from_slice(data), "application/octet-stream")
            .await
            .unwrap();
    }

    pub async fn has_file(&self, key: &str) -> bool {
        self.inner.exists(key).await.unwrap()
    }

    pub async fn stored_keys(&self) -> Vec<String> {
        self.inner.keys().await
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self
            .put_delays
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| data.starts_with(prefix))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = self.fail_all_puts.load(Ordering::SeqCst)
            || self
                .fail_put_prefixes
                .lock()
                .unwrap()
                .iter()
                .any(|prefix| data.starts_with(prefix));
        if should_fail {
            return Err(StorageError::UploadFailed(format!(
                "simulated transport failure for {}",
                storage_key
            )));
        }

        let url = self.inner.put(storage_key, data, content_type).await?;
        self.completed_puts
            .lock()
            .unwrap()
            .push(storage_key.to_string());
        Ok(url)
    }

    async fn get(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.inner.get(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_all_deletes.load(Ordering::SeqCst)
            || self.fail_delete_keys.lock().unwrap().contains(storage_key)
        {
            return Err(StorageError::DeleteFailed(format!(
                "simulated transport failure for {}",
                storage_key
            )));
        }

        self.inner.delete(storage_key).await?;
        self.deleted_keys
            .lock()
            .unwrap()
            .push(storage_key.to_string());
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
