//! Domain models for the trip photo pipeline.
//!
//! Files flow through these types in order: a [`SourceFile`] is accepted by
//! the validator, becomes a [`CompressionOutcome`] after the compressor, and
//! finally an [`ImageDescriptor`] once the bytes are durably stored. Gallery
//! descriptors are kept in a [`GalleryCollection`].

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A user-supplied file as handed over by the UI layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Declared file name; may be empty when the browser did not provide one.
    pub name: String,
    /// Declared MIME type; may be empty.
    pub content_type: String,
    pub data: Bytes,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Declared byte size of the file.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Name used in logs and error messages.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<unnamed>"
        } else {
            &self.name
        }
    }
}

/// A file ready to be sent to the blob store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
    pub last_modified: DateTime<Utc>,
}

impl CompressedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Wrap an untouched source file. The bytes, name and MIME type are kept
    /// exactly as supplied.
    pub fn passthrough(file: SourceFile, last_modified: DateTime<Utc>) -> Self {
        Self {
            name: file.name,
            content_type: file.content_type,
            data: file.data,
            last_modified,
        }
    }
}

/// Result of the best-effort compression step.
///
/// Compression never fails the pipeline; an image that cannot be decoded or
/// re-encoded is carried forward unchanged as [`CompressionOutcome::Passthrough`]
/// so callers can still observe that the optimization was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompressionOutcome {
    Compressed {
        file: CompressedFile,
        original_size: usize,
        width: u32,
        height: u32,
    },
    Passthrough {
        file: CompressedFile,
        reason: String,
    },
}

impl CompressionOutcome {
    pub fn into_file(self) -> CompressedFile {
        match self {
            CompressionOutcome::Compressed { file, .. } => file,
            CompressionOutcome::Passthrough { file, .. } => file,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, CompressionOutcome::Passthrough { .. })
    }
}

/// Where an image belongs within a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageContext {
    Cover,
    Gallery,
}

impl Display for ImageContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ImageContext::Cover => write!(f, "cover"),
            ImageContext::Gallery => write!(f, "gallery"),
        }
    }
}

/// Metadata record for one durably stored image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub url: String,
    /// Storage key; stable and used for deletion. Empty for legacy records.
    pub path: String,
    pub filename: String,
    pub original_name: String,
    /// Byte size after compression.
    pub size: u64,
    /// Zero-based gallery position. Always 0 for a cover image.
    pub order: usize,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub content_type: String,
}

/// Ordered gallery of one trip.
///
/// Operations never mutate a collection in place from the outside; they take
/// a snapshot and hand back the next one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GalleryCollection(Vec<ImageDescriptor>);

impl GalleryCollection {
    pub fn new(items: Vec<ImageDescriptor>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageDescriptor> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageDescriptor> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ImageDescriptor] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<ImageDescriptor> {
        self.0
    }

    pub fn orders(&self) -> Vec<usize> {
        self.0.iter().map(|d| d.order).collect()
    }

    /// True when `order` values are exactly `0..len` in sequence.
    pub fn is_dense(&self) -> bool {
        self.0.iter().enumerate().all(|(i, d)| d.order == i)
    }

    /// Reassign every `order` to its positional index.
    pub fn renumbered(mut self) -> Self {
        for (i, descriptor) in self.0.iter_mut().enumerate() {
            descriptor.order = i;
        }
        self
    }
}

impl From<Vec<ImageDescriptor>> for GalleryCollection {
    fn from(items: Vec<ImageDescriptor>) -> Self {
        Self(items)
    }
}

impl IntoIterator for GalleryCollection {
    type Item = ImageDescriptor;
    type IntoIter = std::vec::IntoIter<ImageDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a GalleryCollection {
    type Item = &'a ImageDescriptor;
    type IntoIter = std::slice::Iter<'a, ImageDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
