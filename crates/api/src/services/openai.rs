//! OpenAI-compatible chat completions client for caption rewriting.

use std::time::Duration;

use async_trait::async_trait;
use domain::services::{StoryError, StoryInput, StoryWriter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::AiConfig;

const SYSTEM_PROMPT: &str = "You are a professional storyteller. Rewrite the following memory into a beautiful, polished, and emotional short story. Keep it under 100 words.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Story writer backed by a chat completions endpoint.
pub struct OpenAiStoryWriter {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiStoryWriter {
    pub fn new(config: &AiConfig) -> Result<Self, StoryError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StoryError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn build_request(&self, input: &StoryInput<'_>) -> ChatRequest<'_> {
        let user_content = match input.image {
            Some(image) => json!([
                { "type": "text", "text": input.text },
                {
                    "type": "image_url",
                    "image_url": {
                        "url": format!(
                            "data:{};base64,{}",
                            image.mime_type,
                            shared::crypto::base64_encode(image.bytes)
                        )
                    }
                }
            ]),
            None => Value::String(input.text.to_string()),
        };

        ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                json!({ "role": "system", "content": SYSTEM_PROMPT }),
                json!({ "role": "user", "content": user_content }),
            ],
        }
    }
}

#[async_trait]
impl StoryWriter for OpenAiStoryWriter {
    async fn rewrite(&self, input: StoryInput<'_>) -> Result<String, StoryError> {
        let request = self.build_request(&input);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoryError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoryError::Http(format!("HTTP {}: {}", status, body)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| StoryError::InvalidResponse(e.to_string()))?;

        let story = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| StoryError::InvalidResponse("no choices returned".to_string()))?;

        debug!(model = %self.model, chars = story.len(), "Caption rewritten");
        Ok(story)
    }
}
