//! Backend adapters for the gateway.
//!
//! Each adapter translates one (model, content, system prompt) triple into a
//! single call against a concrete backend:
//! - **llama_cli**: one-shot `llama-cli` subprocess against a local GGUF file
//! - **llama_http**: llama-server chat-completions endpoint
//! - **ollama**: managed Ollama chat API, used when no local artifact exists
//!
//! Adapters never retry and never fall back themselves; that is the router's
//! job.

pub mod llama_cli;
pub mod llama_http;
pub mod ollama;

pub use llama_cli::{LlamaCliConfig, LlamaCliProvider};
pub use llama_http::LlamaServerProvider;
pub use ollama::OllamaProvider;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Completion length cap passed to every backend.
pub const MAX_COMPLETION_TOKENS: u32 = 512;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure of a single backend attempt. A failure is never retried against
/// the same backend; the router only uses it to decide what to report.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The artifact disappeared between the availability check and the run.
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    /// The subprocess could not be launched or exited non-zero.
    #[error("llama.cpp failed for {model}: {stderr}")]
    Process { model: String, stderr: String },
    /// The subprocess exceeded its wall-clock budget and was killed.
    #[error("llama.cpp timed out after {timeout_secs}s for {model}")]
    Timeout { model: String, timeout_secs: u64 },
    /// llama-server answered with a non-2xx status.
    #[error("Llama-server HTTP error: {status}")]
    HttpStatus { status: u16 },
    /// llama-server answered 2xx but the payload lacked the expected
    /// `choices[0].message.content` shape. Distinct from [`Self::HttpStatus`]
    /// so callers can tell "server up but malformed" from "server down".
    #[error("Invalid response format from llama-server")]
    MalformedResponse,
    /// llama-server could not be reached at all.
    #[error("llama-server request failed: {0}")]
    HttpTransport(String),
    /// Whatever the managed service reported, verbatim.
    #[error("ollama request failed: {0}")]
    Managed(String),
}

// ---------------------------------------------------------------------------
// Common types
// ---------------------------------------------------------------------------

/// A chat message with a role and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Optional leading system message, then exactly one user message.
pub fn build_messages(content: &str, system_prompt: Option<&str>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(prompt) = system_prompt {
        messages.push(ChatMessage::system(prompt));
    }
    messages.push(ChatMessage::user(content));
    messages
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Common interface for all answer-producing backends.
///
/// Implementations stay thin: translate the triple into one backend call and
/// map the outcome into a plain answer string or a tagged failure.
pub trait ChatProvider: Send + Sync {
    /// Short backend tag used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Produce one answer. Exactly one backend attempt per call.
    fn chat(
        &self,
        model: &str,
        content: &str,
        system_prompt: Option<&str>,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;
}

// ---------------------------------------------------------------------------
// Dyn-compatible wrapper for ChatProvider
// ---------------------------------------------------------------------------

type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<String, BackendError>> + Send + 'a>>;

/// Object-safe version of [`ChatProvider`], using boxed futures.
///
/// Auto-implemented for every `T: ChatProvider + 'static`. The router holds
/// its backends as `Arc<dyn ChatProviderDyn>` so the concrete adapter type is
/// erased and tests can substitute recording doubles.
pub trait ChatProviderDyn: Send + Sync {
    fn name(&self) -> &'static str;

    fn chat_dyn<'a>(
        &'a self,
        model: &'a str,
        content: &'a str,
        system_prompt: Option<&'a str>,
    ) -> ChatFuture<'a>;
}

impl<T: ChatProvider + 'static> ChatProviderDyn for T {
    fn name(&self) -> &'static str {
        ChatProvider::name(self)
    }

    fn chat_dyn<'a>(
        &'a self,
        model: &'a str,
        content: &'a str,
        system_prompt: Option<&'a str>,
    ) -> ChatFuture<'a> {
        Box::pin(self.chat(model, content, system_prompt))
    }
}
