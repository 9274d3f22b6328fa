use tripmedia_core::{PipelineConfig, PipelineError, PipelineResult, SourceFile};

/// Pre-flight file validator
///
/// A pure predicate over file metadata: no decoding, disk or network access.
/// Rules are checked in order and the first failure wins:
/// 1. the MIME type must be in the allow-set,
/// 2. the byte size must not exceed the ceiling.
#[derive(Clone, Debug)]
pub struct MediaValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_content_types.clone(),
        )
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> PipelineResult<()> {
        let normalized = content_type.trim().to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(PipelineError::UnsupportedType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> PipelineResult<()> {
        if size > self.max_file_size {
            return Err(PipelineError::TooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate a file against every rule.
    pub fn validate(&self, file: &SourceFile) -> PipelineResult<()> {
        self.validate_content_type(&file.content_type)?;
        self.validate_file_size(file.size())?;
        Ok(())
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }
}
