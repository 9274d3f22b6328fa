//! Shared fixtures for service tests.

pub mod mock_storage;

pub use mock_storage::MockStorage;

use chrono::{TimeZone, Utc};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tripmedia_core::{GalleryCollection, ImageDescriptor, SourceFile};

/// A file the compressor cannot decode; its bytes reach storage unchanged.
pub fn opaque_file(name: &str, payload: &[u8]) -> SourceFile {
    SourceFile::new(name, "image/jpeg", payload.to_vec())
}

/// A real PNG of the given size.
pub fn png_file(name: &str, width: u32, height: u32) -> SourceFile {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    SourceFile::new(name, "image/png", buffer)
}

pub fn descriptor(name: &str, order: usize) -> ImageDescriptor {
    let path = format!("trips/owner-1/trip-1/gallery/{}", name);
    ImageDescriptor {
        url: format!("https://storage.example.com/{}", path),
        path,
        filename: name.to_string(),
        original_name: name.to_string(),
        size: 100,
        order,
        uploaded_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        content_type: "image/jpeg".to_string(),
    }
}

pub fn gallery(names: &[&str]) -> GalleryCollection {
    GalleryCollection::new(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| descriptor(name, i))
            .collect(),
    )
}

pub fn names(collection: &GalleryCollection) -> Vec<String> {
    collection.iter().map(|d| d.filename.clone()).collect()
}
