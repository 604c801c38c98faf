/// OpenAI chat-completions provider
///
/// Wraps the chat-completions endpoint behind the TextGenerator trait. The
/// reply is returned as a raw text blob; JSON extraction happens upstream in
/// the recommendation service, which tolerates prose-wrapped replies.
use crate::{
    error::{AppError, AppResult},
    services::providers::TextGenerator,
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiProvider {
    /// Creates a provider with an explicit request timeout.
    ///
    /// The timeout is mandatory: a recommendation call left unbounded would
    /// hold the caller for as long as the provider feels like.
    pub fn new(api_key: String, api_url: String, model: String, timeout_secs: u64) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            api_key,
            api_url,
            model,
        }
    }

    fn extract_text(response: ChatResponse) -> AppResult<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::ExternalApi("Empty completion reply".to_string()))
    }
}

#[async_trait::async_trait]
impl TextGenerator for OpenAiProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.api_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens,
            temperature,
        };

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
                "Completion API returned status {}: {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response.json().await?;
        let text = Self::extract_text(chat_response)?;

        tracing::info!(
            model = %self.model,
            reply_chars = text.len(),
            provider = "openai",
            "Completion received"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
