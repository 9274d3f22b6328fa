use anyhow::{anyhow, Result};
use bytes::Bytes;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageFormat};
use std::io::Cursor;
use tripmedia_core::{CompressedFile, CompressionOutcome, PipelineConfig, SourceFile};

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Output encoding, always the same family as the input MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Map a MIME type to its encoder. An empty type is treated as JPEG.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().to_lowercase().as_str() {
            "" | "image/jpeg" | "image/jpg" => Some(OutputFormat::Jpeg),
            "image/png" => Some(OutputFormat::Png),
            "image/webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }
}

/// Compute the target size for a `width` x `height` image.
///
/// Both dimensions are scaled by `min(max_width / width, max_width / height)`,
/// clamped to 1 so images are never upscaled.
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let max = max_width as f64;
    let ratio = (max / width as f64).min(max / height as f64).min(1.0);
    let scale = |d: u32| ((d as f64 * ratio).round() as u32).clamp(1, max_width.max(1));
    (scale(width), scale(height))
}

/// Best-effort image compressor
///
/// Downsamples to fit `max_width` on both axes and re-encodes with the
/// original MIME type at `quality` (0, 1]. Never fails: anything that cannot
/// be decoded or encoded comes back as [`CompressionOutcome::Passthrough`].
#[derive(Debug, Clone, Copy)]
pub struct ImageCompressor {
    max_width: u32,
    quality: f32,
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self::new(1200, 0.8)
    }
}

impl ImageCompressor {
    pub fn new(max_width: u32, quality: f32) -> Self {
        Self {
            max_width: max_width.max(1),
            quality: quality.clamp(0.01, 1.0),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.compress_max_width, config.compress_quality)
    }

    /// Compress on the blocking pool so decoding does not stall other uploads.
    pub async fn compress_async(&self, file: SourceFile) -> CompressionOutcome {
        let compressor = *self;
        let fallback = file.clone();
        match tokio::task::spawn_blocking(move || compressor.compress(file)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    file = %fallback.display_name(),
                    "Compression task failed, uploading original"
                );
                CompressionOutcome::Passthrough {
                    file: CompressedFile::passthrough(fallback, Utc::now()),
                    reason: format!("compression task failed: {}", e),
                }
            }
        }
    }

    /// Compress one file.
    pub fn compress(&self, file: SourceFile) -> CompressionOutcome {
        match self.try_compress(&file) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    file = %file.display_name(),
                    content_type = %file.content_type,
                    "Image compression skipped, uploading original"
                );
                CompressionOutcome::Passthrough {
                    reason: e.to_string(),
                    file: CompressedFile::passthrough(file, Utc::now()),
                }
            }
        }
    }

    fn try_compress(&self, file: &SourceFile) -> Result<CompressionOutcome> {
        let format = OutputFormat::from_content_type(&file.content_type)
            .ok_or_else(|| anyhow!("no encoder for content type '{}'", file.content_type))?;

        let mut decoder = image::ImageReader::new(Cursor::new(file.data.as_ref()))
            .with_guessed_format()?
            .into_decoder()?;
        // A malformed EXIF block is treated as upright.
        let orientation = decoder
            .orientation()
            .unwrap_or(Orientation::NoTransforms);
        let mut img = DynamicImage::from_decoder(decoder)?;

        // Encoders write no EXIF; the rotation lives in the pixels from here on.
        if orientation != Orientation::NoTransforms {
            tracing::debug!(
                file = %file.display_name(),
                orientation = ?orientation,
                "Applying EXIF orientation"
            );
            img.apply_orientation(orientation);
        }

        let (width, height) = img.dimensions();
        let (target_width, target_height) = scaled_dimensions(width, height, self.max_width);

        let resized = if (target_width, target_height) == (width, height) {
            img
        } else {
            img.resize_exact(target_width, target_height, FilterType::Triangle)
        };

        let data = self.encode(&resized, format)?;
        let now = Utc::now();

        let name = if file.name.trim().is_empty() {
            format!("image_{}.jpg", now.timestamp_millis())
        } else {
            file.name.clone()
        };
        let content_type = if file.content_type.trim().is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            file.content_type.clone()
        };

        tracing::debug!(
            file = %name,
            original_width = width,
            original_height = height,
            width = target_width,
            height = target_height,
            original_size = file.size(),
            compressed_size = data.len(),
            "Image compressed"
        );

        Ok(CompressionOutcome::Compressed {
            file: CompressedFile {
                name,
                content_type,
                data,
                last_modified: now,
            },
            original_size: file.size(),
            width: target_width,
            height: target_height,
        })
    }

    fn encode(&self, img: &DynamicImage, format: OutputFormat) -> Result<Bytes> {
        match format {
            OutputFormat::Jpeg => self.encode_jpeg(img),
            OutputFormat::Png => Self::encode_png(img),
            OutputFormat::WebP => self.encode_webp(img),
        }
    }

    fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// JPEG has no alpha channel; transparent pixels are flattened.
    fn encode_jpeg(&self, img: &DynamicImage) -> Result<Bytes> {
        let rgb_img = img.to_rgb8();
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality());
        rgb_img.write_with_encoder(encoder)?;
        Ok(Bytes::from(buffer))
    }

    /// PNG is lossless, quality does not apply.
    fn encode_png(img: &DynamicImage) -> Result<Bytes> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, ImageFormat::Png)?;
        Ok(Bytes::from(buffer))
    }

    fn encode_webp(&self, img: &DynamicImage) -> Result<Bytes> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(self.quality * 100.0);

        Ok(Bytes::copy_from_slice(&webp_data))
    }
}
