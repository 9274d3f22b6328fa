//! Error types module
//!
//! All pipeline failures are unified under [`PipelineError`]. Pre-flight
//! rejections (`UnsupportedType`, `TooLarge`, `TooManyImages`) are produced
//! before any network I/O and carry the violated constraint in their message,
//! so they can be shown to the end user verbatim.
//!
//! Degraded compression is deliberately absent here: it is not a failure and
//! is reported through [`crate::CompressionOutcome::Passthrough`].

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues the user can retry
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to callers.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same operation may succeed
    fn is_recoverable(&self) -> bool;

    /// Client-facing message
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// One failed file within a batch.
#[derive(Debug)]
pub struct FileFailure {
    pub file: String,
    pub error: PipelineError,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Unsupported file type: {content_type} (allowed: {allowed:?})")]
    UnsupportedType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error(
        "Too many images: you can only upload {} more images ({max} max per trip), {requested} requested",
        remaining(.max, .existing)
    )]
    TooManyImages {
        existing: usize,
        requested: usize,
        max: usize,
    },

    #[error("Upload failed for {file}: {cause}")]
    UploadFailed { file: String, cause: String },

    #[error("Delete failed for {path}: {cause}")]
    DeleteFailed { path: String, cause: String },

    #[error("{} of {} uploads failed: {}", .failures.len(), .total, summarize(.failures))]
    BatchFailed {
        total: usize,
        failures: Vec<FileFailure>,
        /// Keys that were stored but could not be (or were not) cleaned up.
        orphaned_keys: Vec<String>,
    },

    #[error("Index {index} out of range for gallery of {len} images")]
    InvalidIndex { index: usize, len: usize },

    #[error("Invalid storage key segment: {0}")]
    InvalidKeySegment(String),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

fn remaining(max: &usize, existing: &usize) -> usize {
    max.saturating_sub(*existing)
}

fn summarize(failures: &[FileFailure]) -> String {
    match failures.first() {
        Some(first) if failures.len() == 1 => format!("{}: {}", first.file, first.error),
        Some(first) => format!(
            "{}: {} (and {} more)",
            first.file,
            first.error,
            failures.len() - 1
        ),
        None => "no failure details".to_string(),
    }
}

impl PipelineError {
    /// True for errors raised before any network call was made.
    pub fn is_preflight(&self) -> bool {
        match self {
            PipelineError::UnsupportedType { .. }
            | PipelineError::TooLarge { .. }
            | PipelineError::TooManyImages { .. } => true,
            PipelineError::BatchFailed { failures, .. } => {
                !failures.is_empty() && failures.iter().all(|f| f.error.is_preflight())
            }
            _ => false,
        }
    }

    /// Failures of a batch error, empty for every other variant.
    pub fn failures(&self) -> &[FileFailure] {
        match self {
            PipelineError::BatchFailed { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn static_metadata(err: &PipelineError) -> (&'static str, bool, LogLevel) {
    match err {
        PipelineError::UnsupportedType { .. } => ("UNSUPPORTED_TYPE", false, LogLevel::Debug),
        PipelineError::TooLarge { .. } => ("TOO_LARGE", false, LogLevel::Debug),
        PipelineError::TooManyImages { .. } => ("TOO_MANY_IMAGES", false, LogLevel::Debug),
        PipelineError::UploadFailed { .. } => ("UPLOAD_FAILED", true, LogLevel::Error),
        PipelineError::DeleteFailed { .. } => ("DELETE_FAILED", true, LogLevel::Warn),
        PipelineError::BatchFailed { failures, .. } => {
            let recoverable = failures.iter().all(|f| f.error.is_recoverable());
            let level = if recoverable {
                LogLevel::Error
            } else {
                LogLevel::Debug
            };
            ("BATCH_FAILED", recoverable, level)
        }
        PipelineError::InvalidIndex { .. } => ("INVALID_INDEX", false, LogLevel::Debug),
        PipelineError::InvalidKeySegment(_) => ("INVALID_KEY_SEGMENT", false, LogLevel::Debug),
    }
}

impl ErrorMetadata for PipelineError {
    fn error_code(&self) -> &'static str {
        static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        static_metadata(self).1
    }

    fn client_message(&self) -> String {
        match self {
            PipelineError::UnsupportedType { content_type, .. } => format!(
                "Invalid image file type '{}'. Please upload JPG, PNG, or WebP files.",
                content_type
            ),
            PipelineError::TooLarge { max, .. } => format!(
                "Invalid image file. Please upload images under {} MB.",
                max / (1024 * 1024)
            ),
            PipelineError::TooManyImages { .. } => self.to_string(),
            PipelineError::UploadFailed { file, .. } => format!("Failed to upload {}", file),
            PipelineError::DeleteFailed { .. } => {
                "Failed to delete image. It is still stored; please try again.".to_string()
            }
            PipelineError::BatchFailed { failures, .. } => match failures.first() {
                Some(first) => format!(
                    "Upload failed for {}: {}",
                    first.file,
                    first.error.client_message()
                ),
                None => "Upload failed".to_string(),
            },
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        static_metadata(self).2
    }
}
