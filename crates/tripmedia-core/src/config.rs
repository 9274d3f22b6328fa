//! Configuration module
//!
//! [`PipelineConfig`] is an explicit value constructed once at startup and
//! threaded through the pipeline. It is never looked up globally.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

// Pipeline defaults
const MAX_IMAGE_SIZE_BYTES: usize = 5 * 1024 * 1024;
const MAX_IMAGES_PER_TRIP: usize = 20;
const COMPRESS_MAX_WIDTH: u32 = 1200;
const COMPRESS_QUALITY: f32 = 0.8;
const ALLOWED_CONTENT_TYPES: &str = "image/jpeg,image/jpg,image/png,image/webp";

/// What to do with sibling objects already stored when a batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Delete already-stored siblings (best effort).
    #[default]
    Compensate,
    /// Leave them in the store and report their keys.
    Leave,
}

impl FromStr for OrphanPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compensate" => Ok(OrphanPolicy::Compensate),
            "leave" => Ok(OrphanPolicy::Leave),
            _ => Err(anyhow::anyhow!("Invalid orphan policy: {}", s)),
        }
    }
}

/// Pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    // Validation
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub max_images_per_trip: usize,
    // Compression
    pub compress_max_width: u32,
    pub compress_quality: f32,
    // Batch failure handling
    pub orphan_policy: OrphanPolicy,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_IMAGE_SIZE_BYTES,
            allowed_content_types: split_list(ALLOWED_CONTENT_TYPES),
            max_images_per_trip: MAX_IMAGES_PER_TRIP,
            compress_max_width: COMPRESS_MAX_WIDTH,
            compress_quality: COMPRESS_QUALITY,
            orphan_policy: OrphanPolicy::default(),
            storage_backend: StorageBackend::Memory,
            local_storage_path: None,
            local_storage_base_url: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl PipelineConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.storage_backend,
        };

        let orphan_policy = match lookup("ORPHAN_POLICY") {
            Some(raw) => raw.parse()?,
            None => defaults.orphan_policy,
        };

        let config = PipelineConfig {
            max_file_size_bytes: lookup("MAX_IMAGE_SIZE_BYTES")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(MAX_IMAGE_SIZE_BYTES),
            allowed_content_types: lookup("ALLOWED_CONTENT_TYPES")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.allowed_content_types),
            max_images_per_trip: lookup("MAX_IMAGES_PER_TRIP")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(MAX_IMAGES_PER_TRIP),
            compress_max_width: lookup("COMPRESS_MAX_WIDTH")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(COMPRESS_MAX_WIDTH),
            compress_quality: lookup("COMPRESS_QUALITY")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(COMPRESS_QUALITY),
            orphan_policy,
            storage_backend,
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION").or_else(|| lookup("AWS_REGION")),
            s3_endpoint: lookup("S3_ENDPOINT"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    pub fn with_max_images_per_trip(mut self, max: usize) -> Self {
        self.max_images_per_trip = max;
        self
    }

    pub fn with_compression(mut self, max_width: u32, quality: f32) -> Self {
        self.compress_max_width = max_width;
        self.compress_quality = quality;
        self
    }

    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    pub fn with_local_storage(
        mut self,
        path: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        self.storage_backend = StorageBackend::Local;
        self.local_storage_path = Some(path.into());
        self.local_storage_base_url = Some(base_url.into());
        self
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_IMAGE_SIZE_BYTES must be greater than zero"
            ));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must list at least one MIME type"
            ));
        }

        if self.max_images_per_trip == 0 {
            return Err(anyhow::anyhow!(
                "MAX_IMAGES_PER_TRIP must be greater than zero"
            ));
        }

        if self.compress_max_width == 0 {
            return Err(anyhow::anyhow!("COMPRESS_MAX_WIDTH must be greater than zero"));
        }

        if !(self.compress_quality > 0.0 && self.compress_quality <= 1.0) {
            return Err(anyhow::anyhow!(
                "COMPRESS_QUALITY must be in (0, 1], got {}",
                self.compress_quality
            ));
        }

        // Validate storage backend configuration
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }
}
