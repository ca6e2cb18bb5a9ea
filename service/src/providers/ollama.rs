//! Managed Ollama backend, the universal fallback for models without a local
//! artifact.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::providers::{build_messages, BackendError, ChatMessage, ChatProvider};

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// Raw-completion reply shape: the answer lives in a top-level
/// `message.content`, not in a choices list.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
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

impl ChatProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn chat(
        &self,
        model: &str,
        content: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest {
            model,
            messages: build_messages(content, system_prompt),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Managed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BackendError::Managed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail.trim()
            )));
        }

        let decoded: OllamaChatResponse = response
            .json()
            .await
            .map_err(|_| BackendError::Managed("unexpected response shape".to_string()))?;

        Ok(decoded.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let provider = OllamaProvider::new("http://localhost:11434/", Duration::from_secs(5));
        assert_eq!(provider.base_url(), "http://localhost:11434");
    }
}
