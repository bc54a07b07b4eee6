use super::{ChatService, ImageGenerationService};
use crate::models::DreamSubmission;
use crate::variation::Variation;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_PROMPT_SET: &str = "Prompt 1: A wooden bridge over a still lake at dawn\n\n\
Prompt 2: The same lake under an overcast autumn sky\n\n\
Prompt 3: A wide view of the lake and bridge at dusk in winter";

pub const DEFAULT_INTERPRETATION: &str = r#"{
  "symbolic_meaning": "The lake stands for the depth of your inner world",
  "psychological_interpretation": "You are looking for a calm transition",
  "key_symbols": ["lake: the unconscious", "bridge: change", "clouds: uncertainty"],
  "emotional_analysis": "A quiet tension between caution and hope",
  "future_advice": "Take the next step slowly",
  "positive_aspects": "You are open to change",
  "points_to_consider": "Do not ignore fatigue"
}"#;

/// Replays queued replies in order and cycles once exhausted.
#[derive(Clone, Default)]
struct Replies(Arc<Mutex<Vec<String>>>);

impl Replies {
    fn push(&self, reply: String) {
        self.0.lock().unwrap().push(reply);
    }

    fn next(&self, call: usize, default: impl FnOnce() -> String) -> String {
        let replies = self.0.lock().unwrap();
        if replies.is_empty() {
            default()
        } else {
            replies[call % replies.len()].clone()
        }
    }
}

#[derive(Clone, Default)]
struct Counter(Arc<Mutex<usize>>);

impl Counter {
    /// Increment and return the zero-based index of this call.
    fn bump(&self) -> usize {
        let mut count = self.0.lock().unwrap();
        *count += 1;
        *count - 1
    }

    fn get(&self) -> usize {
        *self.0.lock().unwrap()
    }
}

#[derive(Clone, Default)]
pub struct MockChatClient {
    keywords: Replies,
    image_prompts: Replies,
    prompt_sets: Replies,
    interpretations: Replies,
    keyword_calls: Counter,
    image_prompt_calls: Counter,
    prompt_set_calls: Counter,
    interpretation_calls: Counter,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keywords_response(self, response: String) -> Self {
        self.keywords.push(response);
        self
    }

    pub fn with_image_prompt_response(self, response: String) -> Self {
        self.image_prompts.push(response);
        self
    }

    pub fn with_prompt_set_response(self, response: String) -> Self {
        self.prompt_sets.push(response);
        self
    }

    pub fn with_interpretation_response(self, response: String) -> Self {
        self.interpretations.push(response);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.keyword_calls.get()
            + self.image_prompt_calls.get()
            + self.prompt_set_calls.get()
            + self.interpretation_calls.get()
    }

    pub fn get_interpretation_call_count(&self) -> usize {
        self.interpretation_calls.get()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn extract_keywords(&self, narrative: &str) -> Result<String> {
        let call = self.keyword_calls.bump();
        Ok(self.keywords.next(call, || {
            narrative
                .split(['、', ',', ' '])
                .filter(|w| !w.is_empty())
                .take(3)
                .collect::<Vec<_>>()
                .join(", ")
        }))
    }

    async fn compose_image_prompt(&self, keywords: &str) -> Result<String> {
        let call = self.image_prompt_calls.bump();
        Ok(self
            .image_prompts
            .next(call, || format!("A dreamlike scene with {}", keywords)))
    }

    async fn diversify_prompts(
        &self,
        _narrative: &str,
        _variations: &[Variation],
    ) -> Result<String> {
        let call = self.prompt_set_calls.bump();
        Ok(self
            .prompt_sets
            .next(call, || DEFAULT_PROMPT_SET.to_string()))
    }

    async fn interpret_dream(&self, _submission: &DreamSubmission) -> Result<String> {
        let call = self.interpretation_calls.bump();
        Ok(self
            .interpretations
            .next(call, || DEFAULT_INTERPRETATION.to_string()))
    }
}

#[derive(Clone, Default)]
pub struct MockImageGenerationClient {
    urls: Replies,
    delays_ms: Arc<Mutex<Vec<u64>>>,
    failures_remaining: Arc<Mutex<usize>>,
    prompts: Arc<Mutex<Vec<String>>>,
    calls: Counter,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url_response(self, url: String) -> Self {
        self.urls.push(url);
        self
    }

    /// Delay the n-th call by the n-th value, to shuffle completion order.
    pub fn with_delays_ms(self, delays: Vec<u64>) -> Self {
        *self.delays_ms.lock().unwrap() = delays;
        self
    }

    /// Fail the next `count` calls with a provider error.
    pub fn with_failures(self, count: usize) -> Self {
        *self.failures_remaining.lock().unwrap() = count;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.get()
    }

    pub fn received_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let call = self.calls.bump();
        self.prompts.lock().unwrap().push(prompt.to_string());

        let delay = self.delays_ms.lock().unwrap().get(call).copied();
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        {
            let mut failures = self.failures_remaining.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(Error::AiProvider("Mock image failure".to_string()));
            }
        }

        Ok(self.urls.next(call, || {
            format!("https://images.test/{}.png", urlencoding::encode(prompt))
        }))
    }
}
