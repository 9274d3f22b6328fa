//! Tripmedia Services Library
//!
//! Batch uploads and gallery editing on top of the storage and processing
//! crates. [`MediaPipeline`] is the single entry point for callers.

pub mod gallery;
pub mod pipeline;
pub mod uploader;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use gallery::{append, move_item, GalleryManager};
pub use pipeline::MediaPipeline;
pub use uploader::{BatchUploader, ProgressCallback, UploadState, UploadTask, TEMP_TRIP_ID};

pub use tripmedia_core::{
    CompressionOutcome, GalleryCollection, ImageDescriptor, OrphanPolicy, PipelineConfig,
    PipelineError, PipelineResult, SourceFile,
};
