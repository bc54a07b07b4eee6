use super::client::OpenAiHttpClient;
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::ai::{mime, ImageGenerationService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAiImageClient {
    http: OpenAiHttpClient,
    model: String,
    size: String,
    quality: String,
}

impl OpenAiImageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, Duration::from_secs(120), client),
            model,
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
        }
    }

    pub fn with_output(mut self, size: String, quality: String) -> Self {
        self.size = size;
        self.quality = quality;
        self
    }
}

super::impl_with_openai_base_url!(OpenAiImageClient);

#[async_trait]
impl ImageGenerationService for OpenAiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.size.clone(),
            quality: self.quality.clone(),
        };

        let response: ImageGenerationResponse =
            self.http.post("/v1/images/generations", &request).await?;

        let image_data = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::AiProvider("No image data in OpenAI response".to_string()))?;

        if let Some(url) = image_data.url {
            Ok(url)
        } else if let Some(b64_json) = image_data.b64_json {
            use base64::Engine as _;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(b64_json)
                .map_err(|e| Error::AiProvider(format!("Failed to decode base64 image: {}", e)))?;
            Ok(mime::to_data_url(&bytes))
        } else {
            Err(Error::AiProvider(
                "No image data (neither URL nor base64) in response".to_string(),
            ))
        }
    }
}
