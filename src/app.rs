//! Application orchestration for turning dreams into images and readings.

use crate::ai::{ChatService, ImageGenerationService, OpenAiChatClient, OpenAiImageClient};
use crate::image::{ImageProcessor, ImageService};
use crate::models::{
    Config, DreamInterpretation, DreamSubmission, GeneratedImage, GeneratedPrompt, Visualization,
};
use crate::parse::{self, PROMPT_SET_SIZE};
use crate::progress::Progress;
use crate::variation;
use crate::{Error, Result};
use chrono::Local;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::PathBuf;
use tokio_retry::{strategy::FixedInterval, RetryIf};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Coordinates prompt synthesis, image generation, interpretation and storage.
pub struct App {
    chat: Box<dyn ChatService>,
    image_gen: Box<dyn ImageGenerationService>,
    images: Box<dyn ImageService>,
    settings: PipelineSettings,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub chat: Box<dyn ChatService>,
    pub image_gen: Box<dyn ImageGenerationService>,
    pub image: Box<dyn ImageService>,
}

/// Tuning for the image generation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub concurrency: usize,
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: 3,
            retries: 2,
            retry_delay_ms: 2000,
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            concurrency: config.image_concurrency,
            retries: config.image_retries,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices, settings: PipelineSettings) -> Self {
        Self {
            chat: services.chat,
            image_gen: services.image_gen,
            images: services.image,
            settings,
        }
    }

    /// Construct an app talking to OpenAI, saving under a fresh session directory.
    pub fn from_config(config: &Config) -> Self {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let output_dir = config
            .output_dir
            .join(format!("{}_{}", date, Uuid::new_v4()));

        // Reuse one HTTP connection pool across clients.
        let http_client = reqwest::Client::new();

        info!("Chat model: {}", config.chat_model);
        let chat = OpenAiChatClient::new_with_client(
            config.openai_api_key.clone(),
            config.chat_model.clone(),
            http_client.clone(),
        )
        .with_base_url(config.openai_base_url.clone());

        info!(
            "Image model: {} ({}, {})",
            config.image_model, config.image_size, config.image_quality
        );
        let image_gen = OpenAiImageClient::new_with_client(
            config.openai_api_key.clone(),
            config.image_model.clone(),
            http_client.clone(),
        )
        .with_base_url(config.openai_base_url.clone())
        .with_output(config.image_size.clone(), config.image_quality.clone());

        let image = ImageProcessor::new_with_client(&output_dir, http_client);
        info!("Images will be saved to {}", output_dir.display());

        Self::with_services(
            AppServices {
                chat: Box::new(chat),
                image_gen: Box::new(image_gen),
                image: Box::new(image),
            },
            PipelineSettings::from(config),
        )
    }

    /// Produce the diversified prompt set for a narrative.
    pub async fn synthesize_prompts(&self, narrative: &str) -> Result<Vec<GeneratedPrompt>> {
        let variations = variation::plan(&mut rand::thread_rng(), PROMPT_SET_SIZE);
        for (i, v) in variations.iter().enumerate() {
            info!("Variation {}: {}", i + 1, v);
        }

        let raw = self.chat.diversify_prompts(narrative, &variations).await?;
        let prompts = parse::parse_prompt_set(&raw).map_err(|e| {
            error!("Prompt set rejected: {}", e);
            e
        })?;

        info!("Synthesized {} prompts", prompts.len());
        Ok(prompts)
    }

    /// Generate one image per prompt, returned in prompt order.
    pub async fn generate_images(
        &self,
        prompts: &[GeneratedPrompt],
        progress: &Progress,
    ) -> Result<Vec<GeneratedImage>> {
        let workers = self.settings.concurrency.max(1);
        info!(
            "Generating {} images with {} workers",
            prompts.len(),
            workers
        );

        let images: Vec<GeneratedImage> = stream::iter(prompts.iter().enumerate())
            .map(|(i, prompt)| async move {
                let url = self.generate_with_retry(prompt.as_str(), i + 1).await?;
                progress.inc(1);
                Ok::<_, Error>(GeneratedImage {
                    source_prompt: prompt.clone(),
                    url,
                })
            })
            .buffered(workers)
            .try_collect()
            .await?;

        Ok(images)
    }

    async fn generate_with_retry(&self, prompt: &str, number: usize) -> Result<String> {
        let strategy =
            FixedInterval::from_millis(self.settings.retry_delay_ms).take(self.settings.retries);

        RetryIf::spawn(
            strategy,
            || async move {
                info!("[image {}] Requesting generation", number);
                self.image_gen.generate_image(prompt).await.map_err(|e| {
                    warn!("[image {}] Attempt failed: {}", number, e);
                    e
                })
            },
            |e: &Error| e.is_transient(),
        )
        .await
        .map_err(|e| {
            error!("[image {}] Giving up: {}", number, e);
            e
        })
    }

    /// Produce a validated reading for a submission.
    pub async fn interpret(&self, submission: &DreamSubmission) -> Result<DreamInterpretation> {
        info!(
            "Requesting {} interpretation",
            submission.interpretation_style()
        );
        let raw = self.chat.interpret_dream(submission).await?;
        parse::parse_interpretation(&raw).map_err(|e| {
            error!("Interpretation rejected: {}", e);
            e
        })
    }

    /// Single-image flow: keywords, one prompt, one image.
    pub async fn visualize(&self, narrative: &str) -> Result<Visualization> {
        let keywords = self.chat.extract_keywords(narrative).await?.trim().to_string();
        if keywords.is_empty() {
            return Err(Error::MalformedResponse(
                "keyword reply was empty".to_string(),
            ));
        }
        info!("Keywords: {}", keywords);

        let raw = self.chat.compose_image_prompt(&keywords).await?;
        let prompt = parse::parse_single_prompt(&raw)?;
        info!("Image prompt: {}", prompt);

        let url = self.generate_with_retry(prompt.as_str(), 1).await?;

        Ok(Visualization {
            keywords,
            image: GeneratedImage {
                source_prompt: prompt.clone(),
                url,
            },
            prompt,
        })
    }

    /// Fetch an image and store it as `<base_name>.png`.
    pub async fn download(&self, image: &GeneratedImage, base_name: &str) -> Result<PathBuf> {
        let bytes = self.images.fetch(&image.url).await?;
        let path = self.images.save(&bytes, base_name).await?;
        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockChatClient, MockImageGenerationClient};
    use crate::image::MockImageProcessor;
    use crate::models::InterpretationStyle;
    use crate::prompts::PHOTOREALISM_QUALIFIERS;

    fn settings(concurrency: usize, retries: usize) -> PipelineSettings {
        PipelineSettings {
            concurrency,
            retries,
            retry_delay_ms: 0,
        }
    }

    fn build_app(
        chat: MockChatClient,
        image_gen: MockImageGenerationClient,
        settings: PipelineSettings,
    ) -> App {
        App::with_services(
            AppServices {
                chat: Box::new(chat),
                image_gen: Box::new(image_gen),
                image: Box::new(MockImageProcessor::new().with_base_path("/out".to_string())),
            },
            settings,
        )
    }

    fn prompts(count: usize) -> Vec<GeneratedPrompt> {
        (1..=count)
            .map(|i| GeneratedPrompt::new(format!("prompt-{}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_synthesize_prompts_adds_qualifiers() {
        let app = build_app(
            MockChatClient::new(),
            MockImageGenerationClient::new(),
            settings(3, 0),
        );

        let prompts = app.synthesize_prompts("曇り空、湖、木の橋").await.unwrap();
        assert_eq!(prompts.len(), PROMPT_SET_SIZE);
        for prompt in &prompts {
            let lower = prompt.as_str().to_lowercase();
            for qualifier in PHOTOREALISM_QUALIFIERS {
                assert!(lower.contains(qualifier), "{} missing {}", prompt, qualifier);
            }
        }
    }

    #[tokio::test]
    async fn test_short_prompt_set_is_malformed() {
        let image_gen = MockImageGenerationClient::new();
        let calls = image_gen.clone();
        let app = build_app(
            MockChatClient::new().with_prompt_set_response("Just one prompt".to_string()),
            image_gen,
            settings(3, 0),
        );

        let err = app.synthesize_prompts("a lake").await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert_eq!(calls.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_images_keeps_prompt_order() {
        // Later prompts finish first.
        let image_gen = MockImageGenerationClient::new().with_delays_ms(vec![80, 40, 0]);
        let app = build_app(MockChatClient::new(), image_gen, settings(3, 0));

        let prompts = prompts(3);
        let images = app
            .generate_images(&prompts, &Progress::hidden())
            .await
            .unwrap();

        assert_eq!(images.len(), 3);
        for (prompt, image) in prompts.iter().zip(&images) {
            assert_eq!(&image.source_prompt, prompt);
            assert_eq!(image.url, format!("https://images.test/{}.png", prompt));
        }
    }

    #[tokio::test]
    async fn test_generate_images_with_single_worker() {
        let image_gen = MockImageGenerationClient::new();
        let calls = image_gen.clone();
        let app = build_app(MockChatClient::new(), image_gen, settings(0, 0));

        let images = app
            .generate_images(&prompts(3), &Progress::hidden())
            .await
            .unwrap();

        assert_eq!(images.len(), 3);
        assert_eq!(
            calls.received_prompts(),
            vec!["prompt-1", "prompt-2", "prompt-3"]
        );
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let image_gen = MockImageGenerationClient::new().with_failures(2);
        let calls = image_gen.clone();
        let app = build_app(MockChatClient::new(), image_gen, settings(1, 2));

        let images = app
            .generate_images(&prompts(1), &Progress::hidden())
            .await
            .unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(calls.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_retries_stop_after_configured_count() {
        let image_gen = MockImageGenerationClient::new().with_failures(5);
        let calls = image_gen.clone();
        let app = build_app(MockChatClient::new(), image_gen, settings(1, 2));

        let err = app
            .generate_images(&prompts(1), &Progress::hidden())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
        assert_eq!(calls.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_interpret_returns_all_fields() {
        let app = build_app(
            MockChatClient::new(),
            MockImageGenerationClient::new(),
            settings(3, 0),
        );
        let submission =
            DreamSubmission::new("曇り空、湖、木の橋", InterpretationStyle::Psychological).unwrap();

        let interpretation = app.interpret(&submission).await.unwrap();
        assert!(!interpretation.symbolic_meaning.is_empty());
        assert!(!interpretation.key_symbols.is_empty());
        assert!(!interpretation.points_to_consider.is_empty());
    }

    #[tokio::test]
    async fn test_truncated_interpretation_is_malformed() {
        let app = build_app(
            MockChatClient::new()
                .with_interpretation_response(r#"{"symbolic_meaning": "cut"#.to_string()),
            MockImageGenerationClient::new(),
            settings(3, 0),
        );
        let submission = DreamSubmission::new("a lake", InterpretationStyle::Spiritual).unwrap();

        let err = app.interpret(&submission).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_visualize_single_image() {
        let app = build_app(
            MockChatClient::new(),
            MockImageGenerationClient::new(),
            settings(3, 0),
        );

        let result = app.visualize("曇り空、湖、木の橋").await.unwrap();
        assert_eq!(result.keywords, "曇り空, 湖, 木の橋");
        assert_eq!(result.prompt.as_str(), "A dreamlike scene with 曇り空, 湖, 木の橋");
        assert_eq!(result.image.source_prompt, result.prompt);
        assert!(result.image.url.starts_with("https://images.test/"));
    }

    #[tokio::test]
    async fn test_visualize_rejects_blank_prompt() {
        let app = build_app(
            MockChatClient::new().with_image_prompt_response("   ".to_string()),
            MockImageGenerationClient::new(),
            settings(3, 0),
        );

        let err = app.visualize("a lake").await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_download_fetches_then_saves() {
        let app = build_app(
            MockChatClient::new(),
            MockImageGenerationClient::new(),
            settings(3, 0),
        );
        let image = GeneratedImage {
            source_prompt: GeneratedPrompt::new("lake"),
            url: "https://images.test/lake.png".to_string(),
        };

        let path = app.download(&image, "dream_image_2").await.unwrap();
        assert_eq!(path, PathBuf::from("/out/dream_image_2.png"));
    }
}
