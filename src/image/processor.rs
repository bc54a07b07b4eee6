use super::ImageService;
use crate::ai::mime;
use crate::{Error, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use little_exif::metadata::Metadata;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct ImageProcessor {
    client: Client,
    output_dir: PathBuf,
    timeout: Duration,
}

impl ImageProcessor {
    pub fn new(output_dir: &Path) -> Self {
        Self::new_with_client(output_dir, Client::new())
    }

    /// The output directory is created on the first save.
    pub fn new_with_client(output_dir: &Path, client: Client) -> Self {
        Self {
            client,
            output_dir: output_dir.to_path_buf(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn save_png_sync(image: DynamicImage, path: PathBuf) -> Result<()> {
        image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(decoded) = mime::decode_data_url(url) {
            return decoded;
        }

        tracing::debug!("Fetching image from {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn save(&self, image_data: &[u8], base_name: &str) -> Result<PathBuf> {
        let img = image::load_from_memory(image_data)?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!("{}.png", base_name));

        tokio::task::spawn_blocking({
            let path = path.clone();
            move || Self::save_png_sync(img, path)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Image save task join error: {}", e)))??;

        // Strip embedded metadata so the saved file holds only the picture
        if let Err(e) = Metadata::file_clear_metadata(&path) {
            tracing::warn!("Failed to strip metadata from {}: {}", path.display(), e);
        }

        tracing::info!("Saved image to {}", path.display());
        Ok(path)
    }
}
