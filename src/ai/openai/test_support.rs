use wiremock::matchers::{method, path};
use wiremock::{MockBuilder, ResponseTemplate};

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const IMAGE_GENERATIONS_PATH: &str = "/v1/images/generations";

pub fn post(endpoint: &str) -> MockBuilder {
    wiremock::Mock::given(method("POST")).and(path(endpoint))
}

/// A 200 chat completion whose first choice carries `content`.
pub fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    }))
}
