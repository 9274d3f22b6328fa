//! Tripmedia Core Library
//!
//! This crate provides the domain models, error types and configuration
//! shared by every stage of the trip photo ingestion pipeline.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{OrphanPolicy, PipelineConfig};
pub use error::{ErrorMetadata, FileFailure, LogLevel, PipelineError, PipelineResult};
pub use models::{
    CompressedFile, CompressionOutcome, GalleryCollection, ImageContext, ImageDescriptor,
    SourceFile,
};
pub use storage_types::StorageBackend;
