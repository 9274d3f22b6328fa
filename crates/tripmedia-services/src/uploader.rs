//! Batch upload of trip photos.
//!
//! A batch is all-or-nothing from the caller's point of view: every file is
//! checked before the first byte leaves the process, uploads then run
//! concurrently, and the batch resolves once every upload has settled. A
//! partially stored batch is never returned as a success.

use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tripmedia_core::{
    CompressionOutcome, FileFailure, ImageContext, ImageDescriptor, OrphanPolicy, PipelineConfig,
    PipelineError, PipelineResult, SourceFile,
};
use tripmedia_processing::{ImageCompressor, MediaValidator};
use tripmedia_storage::keys::{derive_key, file_name_of};
use tripmedia_storage::Storage;

/// Progress observer: `(completed, total)`, invoked once per successful upload.
pub type ProgressCallback<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Trip id used for covers picked before the trip has been saved.
pub const TEMP_TRIP_ID: &str = "temp";

/// Attempts to find a key not already claimed in the same batch.
const MAX_KEY_ATTEMPTS: usize = 8;

/// Lifecycle of one file inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Pending,
    Compressing,
    Uploading,
    Stored,
    Failed,
}

impl Display for UploadState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadState::Pending => write!(f, "pending"),
            UploadState::Compressing => write!(f, "compressing"),
            UploadState::Uploading => write!(f, "uploading"),
            UploadState::Stored => write!(f, "stored"),
            UploadState::Failed => write!(f, "failed"),
        }
    }
}

/// One accepted file with the key it will be stored under.
#[derive(Debug)]
pub struct UploadTask {
    pub file: SourceFile,
    pub key: String,
    pub order: usize,
    state: UploadState,
}

impl UploadTask {
    fn new(file: SourceFile, key: String, order: usize) -> Self {
        Self {
            file,
            key,
            order,
            state: UploadState::Pending,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    fn advance(&mut self, next: UploadState) {
        tracing::trace!(
            storage_key = %self.key,
            from = %self.state,
            to = %next,
            "Upload task state change"
        );
        self.state = next;
    }
}

#[derive(Clone)]
pub struct BatchUploader {
    storage: Arc<dyn Storage>,
    validator: MediaValidator,
    compressor: ImageCompressor,
    max_images_per_trip: usize,
    orphan_policy: OrphanPolicy,
}

impl BatchUploader {
    pub fn new(
        storage: Arc<dyn Storage>,
        validator: MediaValidator,
        compressor: ImageCompressor,
        max_images_per_trip: usize,
        orphan_policy: OrphanPolicy,
    ) -> Self {
        Self {
            storage,
            validator,
            compressor,
            max_images_per_trip,
            orphan_policy,
        }
    }

    pub fn from_config(config: &PipelineConfig, storage: Arc<dyn Storage>) -> Self {
        Self::new(
            storage,
            MediaValidator::from_config(config),
            ImageCompressor::from_config(config),
            config.max_images_per_trip,
            config.orphan_policy,
        )
    }

    /// Validate a single file and compress it if it passes.
    pub async fn validate_and_compress(&self, file: SourceFile) -> PipelineResult<CompressionOutcome> {
        self.validator.validate(&file)?;
        Ok(self.compressor.compress_async(file).await)
    }

    /// Upload a batch of gallery photos.
    ///
    /// On success the descriptors come back in input order with
    /// `order = existing_count + index`, whatever order the uploads finished in.
    /// `on_progress` sees `(1, n)` through `(n, n)` on a fully successful batch.
    pub async fn upload_many(
        &self,
        files: Vec<SourceFile>,
        trip_id: &str,
        owner_id: &str,
        existing_count: usize,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> PipelineResult<Vec<ImageDescriptor>> {
        let total = files.len();

        let over_limit = existing_count
            .checked_add(total)
            .map_or(true, |n| n > self.max_images_per_trip);
        if over_limit {
            tracing::debug!(
                existing = existing_count,
                requested = total,
                max = self.max_images_per_trip,
                "Batch rejected: per-trip image limit"
            );
            return Err(PipelineError::TooManyImages {
                existing: existing_count,
                requested: total,
                max: self.max_images_per_trip,
            });
        }

        if files.is_empty() {
            return Ok(Vec::new());
        }

        let rejected: Vec<FileFailure> = files
            .iter()
            .filter_map(|file| {
                self.validator.validate(file).err().map(|error| FileFailure {
                    file: file.display_name().to_string(),
                    error,
                })
            })
            .collect();
        if !rejected.is_empty() {
            tracing::debug!(
                total = total,
                rejected = rejected.len(),
                "Batch rejected during validation"
            );
            return Err(PipelineError::BatchFailed {
                total,
                failures: rejected,
                orphaned_keys: Vec::new(),
            });
        }

        let tasks = self.plan_gallery_tasks(files, trip_id, owner_id, existing_count)?;

        tracing::info!(
            trip_id = %trip_id,
            owner_id = %owner_id,
            total = total,
            existing = existing_count,
            "Starting batch upload"
        );
        let started = Instant::now();

        let completed = AtomicUsize::new(0);
        let results = join_all(tasks.into_iter().map(|task| {
            let completed = &completed;
            async move {
                let name = task.file.display_name().to_string();
                let result = self.run_task(task).await;
                if result.is_ok() {
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(callback) = on_progress {
                        callback(done, total);
                    }
                }
                (name, result)
            }
        }))
        .await;

        let mut descriptors = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (name, result) in results {
            match result {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(error) => failures.push(FileFailure { file: name, error }),
            }
        }

        if failures.is_empty() {
            tracing::info!(
                trip_id = %trip_id,
                total = total,
                duration_ms = started.elapsed().as_millis() as u64,
                "Batch upload completed"
            );
            return Ok(descriptors);
        }

        let stored: Vec<String> = descriptors.into_iter().map(|d| d.path).collect();
        let orphaned_keys = self.handle_orphans(stored).await;

        tracing::warn!(
            trip_id = %trip_id,
            total = total,
            failed = failures.len(),
            orphaned = orphaned_keys.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Batch upload failed"
        );

        Err(PipelineError::BatchFailed {
            total,
            failures,
            orphaned_keys,
        })
    }

    /// Upload a trip's cover photo.
    ///
    /// Without a trip id the cover is filed under [`TEMP_TRIP_ID`].
    pub async fn upload_cover(
        &self,
        file: SourceFile,
        trip_id: Option<&str>,
        owner_id: &str,
    ) -> PipelineResult<ImageDescriptor> {
        self.validator.validate(&file)?;

        let trip_id = trip_id.unwrap_or(TEMP_TRIP_ID);
        let key = derive_key(owner_id, trip_id, ImageContext::Cover, &file.name)?;
        let descriptor = self.run_task(UploadTask::new(file, key, 0)).await?;

        tracing::info!(
            trip_id = %trip_id,
            storage_key = %descriptor.path,
            size_bytes = descriptor.size,
            "Cover uploaded"
        );
        Ok(descriptor)
    }

    /// Assign every accepted file a key that no other file in the batch holds.
    fn plan_gallery_tasks(
        &self,
        files: Vec<SourceFile>,
        trip_id: &str,
        owner_id: &str,
        existing_count: usize,
    ) -> PipelineResult<Vec<UploadTask>> {
        let mut claimed = HashSet::with_capacity(files.len());
        let mut tasks = Vec::with_capacity(files.len());

        for (index, file) in files.into_iter().enumerate() {
            let mut key = derive_key(owner_id, trip_id, ImageContext::Gallery, &file.name)?;
            let mut attempts = 1;
            while claimed.contains(&key) && attempts < MAX_KEY_ATTEMPTS {
                key = derive_key(owner_id, trip_id, ImageContext::Gallery, &file.name)?;
                attempts += 1;
            }
            if !claimed.insert(key.clone()) {
                return Err(PipelineError::UploadFailed {
                    file: file.display_name().to_string(),
                    cause: "could not derive a unique storage key".to_string(),
                });
            }
            tasks.push(UploadTask::new(file, key, existing_count + index));
        }

        Ok(tasks)
    }

    /// Compress and store one file.
    async fn run_task(&self, mut task: UploadTask) -> PipelineResult<ImageDescriptor> {
        task.advance(UploadState::Compressing);
        let outcome = self.compressor.compress_async(task.file.clone()).await;
        if let CompressionOutcome::Passthrough { reason, .. } = &outcome {
            tracing::debug!(
                file = %task.file.display_name(),
                reason = %reason,
                "Uploading original bytes"
            );
        }
        let compressed = outcome.into_file();

        task.advance(UploadState::Uploading);
        let size = compressed.size() as u64;
        let url = match self
            .storage
            .put(&task.key, compressed.data, &compressed.content_type)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                task.advance(UploadState::Failed);
                tracing::warn!(
                    error = %e,
                    storage_key = %task.key,
                    file = %task.file.display_name(),
                    "Upload failed"
                );
                return Err(PipelineError::UploadFailed {
                    file: task.file.display_name().to_string(),
                    cause: e.to_string(),
                });
            }
        };
        task.advance(UploadState::Stored);

        let original_name = if task.file.name.is_empty() {
            compressed.name
        } else {
            task.file.name
        };

        Ok(ImageDescriptor {
            url,
            filename: file_name_of(&task.key).to_string(),
            path: task.key,
            original_name,
            size,
            order: task.order,
            uploaded_at: Utc::now(),
            content_type: compressed.content_type,
        })
    }

    /// Apply the orphan policy to keys stored by a failed batch.
    ///
    /// Returns the keys still present in the store afterwards.
    async fn handle_orphans(&self, stored: Vec<String>) -> Vec<String> {
        if stored.is_empty() {
            return stored;
        }

        match self.orphan_policy {
            OrphanPolicy::Leave => {
                tracing::warn!(
                    count = stored.len(),
                    "Leaving objects from failed batch in storage"
                );
                stored
            }
            OrphanPolicy::Compensate => {
                let results = join_all(stored.into_iter().map(|key| async move {
                    match self.storage.delete(&key).await {
                        Ok(()) => None,
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                storage_key = %key,
                                "Failed to remove object from failed batch"
                            );
                            Some(key)
                        }
                    }
                }))
                .await;
                results.into_iter().flatten().collect()
            }
        }
    }
}
