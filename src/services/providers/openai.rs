use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use crate::error::{AppError, AppResult};
use crate::models::{ChatMessage, ChatRequest, ChatResponse};

use super::CompletionProvider;

/// Model calls get a longer leash than the other upstreams
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling temperature for extraction calls
const EXTRACTION_TEMPERATURE: f64 = 0.7;

/// OpenAI-compatible chat-completions client
pub struct OpenAiChatProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiChatProvider {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiChatProvider {
    async fn complete(&self, system: &str, user: &str) -> AppResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: EXTRACTION_TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        let url = format!("{}/v1/chat/completions", self.api_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Extraction model returned status {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}
