//! Shared key generation for storage backends.
//!
//! Cover images: `trips/{owner_id}/{trip_id}/cover_{epoch_millis}.{ext}`.
//! Gallery images: `trips/{owner_id}/{trip_id}/gallery/{epoch_millis}_{token}.{ext}`.
//!
//! Several gallery files of one batch routinely share a millisecond, so the
//! random token is what keeps their keys apart.

use crate::traits::{StorageError, StorageResult};
use rand::Rng;
use tripmedia_core::{ImageContext, PipelineError, PipelineResult};

const KEY_ROOT: &str = "trips";
const DEFAULT_EXTENSION: &str = "jpg";
const MAX_EXTENSION_LEN: usize = 5;
const TOKEN_LEN: usize = 10;
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Derive the storage key for a file uploaded now.
pub fn derive_key(
    owner_id: &str,
    trip_id: &str,
    context: ImageContext,
    filename: &str,
) -> PipelineResult<String> {
    derive_key_at(
        owner_id,
        trip_id,
        context,
        filename,
        chrono::Utc::now().timestamp_millis(),
    )
}

/// Derive the storage key for a file at a given epoch timestamp (milliseconds).
pub fn derive_key_at(
    owner_id: &str,
    trip_id: &str,
    context: ImageContext,
    filename: &str,
    epoch_millis: i64,
) -> PipelineResult<String> {
    check_segment("owner id", owner_id)?;
    check_segment("trip id", trip_id)?;

    let extension = extension_of(filename);
    let key = match context {
        ImageContext::Cover => format!(
            "{}/{}/{}/cover_{}.{}",
            KEY_ROOT, owner_id, trip_id, epoch_millis, extension
        ),
        ImageContext::Gallery => format!(
            "{}/{}/{}/gallery/{}_{}.{}",
            KEY_ROOT,
            owner_id,
            trip_id,
            epoch_millis,
            random_token(),
            extension
        ),
    };
    Ok(key)
}

/// Extension taken from the file name's last `.` suffix, or `jpg`.
pub fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Last path segment of a key, used as the storage-safe file name.
pub fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

fn random_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

fn check_segment(label: &str, segment: &str) -> PipelineResult<()> {
    if segment.trim().is_empty()
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains("..")
    {
        return Err(PipelineError::InvalidKeySegment(format!(
            "{} '{}' cannot be used in a storage key",
            label, segment
        )));
    }
    Ok(())
}

/// Reject keys that could escape the namespace of a backend.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
