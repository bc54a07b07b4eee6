//! Image fetching and local storage
//!
//! Generated images live behind URLs. This module downloads them (or decodes
//! inline `data:` URLs) and writes them as PNG files for viewing and saving.

pub mod mock;
pub mod processor;

pub use mock::MockImageProcessor;
pub use processor::ImageProcessor;

use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Fetch the bytes behind an image URL.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Store image bytes as `<base_name>.png` and return the written path.
    async fn save(&self, image_data: &[u8], base_name: &str) -> Result<PathBuf>;
}
