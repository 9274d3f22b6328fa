use crate::gallery::GalleryManager;
use crate::uploader::{BatchUploader, ProgressCallback};
use anyhow::Context;
use std::sync::Arc;
use tripmedia_core::{
    CompressionOutcome, GalleryCollection, ImageDescriptor, PipelineConfig, PipelineResult,
    SourceFile,
};
use tripmedia_processing::MediaValidator;
use tripmedia_storage::{create_storage, Storage};

/// Entry point used by the trip editor.
///
/// Wires the validator, compressor, uploader and gallery manager to one
/// storage backend.
#[derive(Clone)]
pub struct MediaPipeline {
    config: PipelineConfig,
    storage: Arc<dyn Storage>,
    validator: MediaValidator,
    uploader: BatchUploader,
    gallery: GalleryManager,
}

impl MediaPipeline {
    pub fn new(config: PipelineConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            validator: MediaValidator::from_config(&config),
            uploader: BatchUploader::from_config(&config, storage.clone()),
            gallery: GalleryManager::new(storage.clone()),
            storage,
            config,
        }
    }

    /// Validate the configuration and build the configured storage backend.
    pub async fn from_config(config: PipelineConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let storage = create_storage(&config)
            .await
            .context("Failed to initialize storage backend")?;

        tracing::info!(
            backend = %storage.backend_type(),
            max_images_per_trip = config.max_images_per_trip,
            orphan_policy = ?config.orphan_policy,
            "Media pipeline initialized"
        );
        Ok(Self::new(config, storage))
    }

    /// Load configuration from the environment and build the pipeline.
    pub async fn from_env() -> anyhow::Result<Self> {
        Self::from_config(PipelineConfig::from_env()?).await
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn validate(&self, file: &SourceFile) -> PipelineResult<()> {
        self.validator.validate(file)
    }

    pub async fn validate_and_compress(&self, file: SourceFile) -> PipelineResult<CompressionOutcome> {
        self.uploader.validate_and_compress(file).await
    }

    /// Upload new gallery photos for a trip whose gallery is `existing`.
    pub async fn upload_many(
        &self,
        files: Vec<SourceFile>,
        trip_id: &str,
        owner_id: &str,
        existing: &GalleryCollection,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> PipelineResult<Vec<ImageDescriptor>> {
        self.uploader
            .upload_many(files, trip_id, owner_id, existing.len(), on_progress)
            .await
    }

    /// Upload new photos and return the gallery with them appended.
    pub async fn add_to_gallery(
        &self,
        files: Vec<SourceFile>,
        trip_id: &str,
        owner_id: &str,
        existing: &GalleryCollection,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> PipelineResult<GalleryCollection> {
        let uploaded = self
            .upload_many(files, trip_id, owner_id, existing, on_progress)
            .await?;
        Ok(self.gallery.append(existing, uploaded))
    }

    pub async fn upload_cover(
        &self,
        file: SourceFile,
        trip_id: Option<&str>,
        owner_id: &str,
    ) -> PipelineResult<ImageDescriptor> {
        self.uploader.upload_cover(file, trip_id, owner_id).await
    }

    /// Delete a cover's stored object. Covers without a path are a no-op.
    pub async fn remove_cover(&self, cover: &ImageDescriptor) -> PipelineResult<()> {
        if cover.path.is_empty() {
            return Ok(());
        }
        self.gallery.delete_image(&cover.path).await
    }

    pub async fn delete_image(&self, path: &str) -> PipelineResult<()> {
        self.gallery.delete_image(path).await
    }

    pub fn append(
        &self,
        collection: &GalleryCollection,
        new_images: Vec<ImageDescriptor>,
    ) -> GalleryCollection {
        self.gallery.append(collection, new_images)
    }

    pub async fn remove_at(
        &self,
        collection: &GalleryCollection,
        index: usize,
    ) -> PipelineResult<GalleryCollection> {
        self.gallery.remove_at(collection, index).await
    }

    pub fn move_item(
        &self,
        collection: &GalleryCollection,
        from: usize,
        to: usize,
    ) -> PipelineResult<GalleryCollection> {
        self.gallery.move_item(collection, from, to)
    }
}
