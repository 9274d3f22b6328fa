//! Tripmedia Processing Library
//!
//! Client-side work done on a photo before any bandwidth is spent on it:
//! the pre-flight [`MediaValidator`] and the best-effort [`ImageCompressor`].

#[cfg(feature = "image")]
pub mod compression;
pub mod validator;

#[cfg(feature = "image")]
pub use compression::{scaled_dimensions, ImageCompressor, OutputFormat};
pub use validator::MediaValidator;
