use super::ImageService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockImageProcessor {
    fetch_count: Arc<Mutex<usize>>,
    saved: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    base_path: String,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            fetch_count: Arc::new(Mutex::new(0)),
            saved: Arc::new(Mutex::new(HashMap::new())),
            base_path: "/tmp".to_string(),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_base_path(mut self, path: String) -> Self {
        self.base_path = path;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_fetch_count(&self) -> usize {
        *self.fetch_count.lock().unwrap()
    }

    pub fn saved_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.saved.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageProcessor {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Generic(format!("Mock fetch failure for {}", url)));
        }

        *self.fetch_count.lock().unwrap() += 1;
        Ok(url.as_bytes().to_vec())
    }

    async fn save(&self, image_data: &[u8], base_name: &str) -> Result<PathBuf> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Image(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }

        let path = PathBuf::from(format!("{}/{}.png", self.base_path, base_name));
        self.saved
            .lock()
            .unwrap()
            .insert(path.clone(), image_data.to_vec());
        Ok(path)
    }
}
