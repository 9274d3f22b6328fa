//! Tripmedia Storage Library
//!
//! This crate provides the blob store abstraction consumed by the photo
//! pipeline, its implementations (local filesystem, in-memory, S3) and the
//! key deriver.
//!
//! # Storage key format
//!
//! All backends share one key namespace:
//!
//! - **Cover image**: `trips/{owner_id}/{trip_id}/cover_{epoch_millis}.{ext}`
//! - **Gallery image**: `trips/{owner_id}/{trip_id}/gallery/{epoch_millis}_{token}.{ext}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{derive_key, derive_key_at};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tripmedia_core::StorageBackend;
