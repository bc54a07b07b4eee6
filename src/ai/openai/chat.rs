use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage, JsonSchema, ResponseFormat};
use crate::ai::ChatService;
use crate::models::DreamSubmission;
use crate::variation::{self, Variation};
use crate::{prompts, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAiChatClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, Duration::from_secs(30), client),
            model,
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: String,
        max_completion_tokens: u32,
        response_format: Option<ResponseFormat>,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_completion_tokens,
            response_format,
        };

        self.http.chat_text(&request).await
    }
}

super::impl_with_openai_base_url!(OpenAiChatClient);

fn interpretation_format() -> ResponseFormat {
    let text = serde_json::json!({ "type": "string" });
    let schema = serde_json::json!({
        "type": "object",
        "properties": {
            "symbolic_meaning": text,
            "psychological_interpretation": text,
            "key_symbols": { "type": "array", "items": text },
            "emotional_analysis": text,
            "future_advice": text,
            "positive_aspects": text,
            "points_to_consider": text
        },
        "required": [
            "symbolic_meaning",
            "psychological_interpretation",
            "key_symbols",
            "emotional_analysis",
            "future_advice",
            "positive_aspects",
            "points_to_consider"
        ],
        "additionalProperties": false
    });

    ResponseFormat {
        format_type: "json_schema".to_string(),
        json_schema: JsonSchema {
            name: "dream_interpretation".to_string(),
            schema,
            strict: true,
        },
    }
}

#[async_trait]
impl ChatService for OpenAiChatClient {
    async fn extract_keywords(&self, narrative: &str) -> Result<String> {
        let user = prompts::render(prompts::KEYWORDS_USER, &[("dream", narrative)]);
        let reply = self.complete(prompts::KEYWORDS_SYSTEM, user, 200, None).await?;
        Ok(reply.trim().to_string())
    }

    async fn compose_image_prompt(&self, keywords: &str) -> Result<String> {
        let user = prompts::render(prompts::IMAGE_PROMPT_USER, &[("keywords", keywords)]);
        let reply = self
            .complete(prompts::IMAGE_PROMPT_SYSTEM, user, 1000, None)
            .await?;
        Ok(reply.trim().to_string())
    }

    async fn diversify_prompts(
        &self,
        narrative: &str,
        variations: &[Variation],
    ) -> Result<String> {
        let system = prompts::render(
            prompts::DIVERSE_SYSTEM,
            &[("qualifiers", &prompts::qualifier_list())],
        );
        let user = prompts::render(
            prompts::DIVERSE_USER,
            &[
                ("dream", narrative),
                ("variations", &variation::describe(variations)),
            ],
        );
        self.complete(&system, user, 2000, None).await
    }

    async fn interpret_dream(&self, submission: &DreamSubmission) -> Result<String> {
        let emotions = submission
            .emotions_csv()
            .unwrap_or_else(|| "none".to_string());
        let intensity = submission.emotion_intensity().value().to_string();
        let notes = match submission.additional_emotion_notes() {
            "" => "none",
            notes => notes,
        };

        let user = prompts::render(
            prompts::INTERPRETATION_USER,
            &[
                ("style", submission.interpretation_style().label()),
                ("dream", submission.narrative()),
                ("emotions", &emotions),
                ("intensity", &intensity),
                ("notes", notes),
            ],
        );

        self.complete(
            prompts::INTERPRETATION_SYSTEM,
            user,
            3000,
            Some(interpretation_format()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::openai::test_support;
    use crate::models::{Emotion, InterpretationStyle};
    use crate::variation::{Distance, Season, TimeOfDay, Weather};
    use crate::Error;
    use wiremock::matchers::{body_string_contains, header};
    use wiremock::{MockServer, ResponseTemplate};

    fn make_client(server: &MockServer, model: &str) -> OpenAiChatClient {
        OpenAiChatClient::new("test-key".to_string(), model.to_string())
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_extract_keywords_trims_reply_and_sends_auth() {
        let server = MockServer::start().await;

        test_support::post(test_support::CHAT_COMPLETIONS_PATH)
            .and(header("Authorization", "Bearer test-key"))
            .and(body_string_contains("\"model\":\"gpt-4o-mini\""))
            .respond_with(test_support::chat_reply("  lake, bridge, clouds \n"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o-mini");
        let keywords = client.extract_keywords("曇り空、湖、木の橋").await.unwrap();
        assert_eq!(keywords, "lake, bridge, clouds");
    }

    #[tokio::test]
    async fn test_diversify_prompts_sends_variations_and_qualifiers() {
        let server = MockServer::start().await;

        test_support::post(test_support::CHAT_COMPLETIONS_PATH)
            .and(body_string_contains("at dusk, light fog, close-up view, autumn"))
            .and(body_string_contains("natural lighting"))
            .respond_with(test_support::chat_reply("Prompt 1: a\n\nPrompt 2: b\n\nPrompt 3: c"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o-mini");
        let variation = Variation {
            time_of_day: TimeOfDay::Dusk,
            weather: Weather::Fog,
            distance: Distance::CloseUp,
            season: Season::Autumn,
        };

        let reply = client
            .diversify_prompts("a lake", &[variation])
            .await
            .unwrap();
        assert!(reply.contains("Prompt 3"));
    }

    #[tokio::test]
    async fn test_interpret_dream_requests_json_schema() {
        let server = MockServer::start().await;

        test_support::post(test_support::CHAT_COMPLETIONS_PATH)
            .and(body_string_contains("\"type\":\"json_schema\""))
            .and(body_string_contains("dream_interpretation"))
            .and(body_string_contains("Primary emotions: fear, relief"))
            .and(body_string_contains("Intensity: 7/10"))
            .and(body_string_contains("psychological dream interpreter"))
            .respond_with(test_support::chat_reply("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o-mini");
        let submission = DreamSubmission::new("a lake", InterpretationStyle::Psychological)
            .unwrap()
            .with_emotions([Emotion::Fear, Emotion::Relief])
            .with_intensity(crate::models::EmotionIntensity::new(7).unwrap());

        let reply = client.interpret_dream(&submission).await.unwrap();
        assert_eq!(reply, "{}");
    }

    #[tokio::test]
    async fn test_interpret_dream_without_emotions_says_none() {
        let server = MockServer::start().await;

        test_support::post(test_support::CHAT_COMPLETIONS_PATH)
            .and(body_string_contains("Primary emotions: none"))
            .and(body_string_contains("Additional notes: none"))
            .respond_with(test_support::chat_reply("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o-mini");
        let submission =
            DreamSubmission::new("曇り空、湖、木の橋", InterpretationStyle::Psychological).unwrap();
        client.interpret_dream(&submission).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post(test_support::CHAT_COMPLETIONS_PATH)
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o-mini");
        let err = client.extract_keywords("a dream").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_empty_choices_returns_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post(test_support::CHAT_COMPLETIONS_PATH)
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let client = make_client(&server, "gpt-4o-mini");
        let err = client.compose_image_prompt("lake").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
