//! llama-server HTTP backend (chat-completions API).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::providers::{
    build_messages, BackendError, ChatMessage, ChatProvider, MAX_COMPLETION_TOKENS,
};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    max_tokens: u32,
}

/// Strict shape of a successful chat-completions reply. Anything a 2xx body
/// fails to decode into is a malformed response, not a transport error.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct LlamaServerProvider {
    base_url: String,
    client: reqwest::Client,
}

impl LlamaServerProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ChatProvider for LlamaServerProvider {
    fn name(&self) -> &'static str {
        "llama-server"
    }

    async fn chat(
        &self,
        model: &str,
        content: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, BackendError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = CompletionRequest {
            model,
            messages: build_messages(content, system_prompt),
            stream: false,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::HttpTransport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let decoded: CompletionResponse = response
            .json()
            .await
            .map_err(|_| BackendError::MalformedResponse)?;

        let first = decoded
            .choices
            .into_iter()
            .next()
            .ok_or(BackendError::MalformedResponse)?;
        Ok(first.message.content)
    }
}
