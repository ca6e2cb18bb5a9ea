//! Wire types for the gateway API.

use serde::{Deserialize, Serialize};

fn default_mode() -> String {
    "cli".to_string()
}

/// Body of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatParams {
    /// Model to query; the configured default when omitted.
    #[serde(default)]
    pub model: Option<String>,
    /// User prompt; must be non-blank.
    #[serde(default)]
    pub content: String,
    /// Execution path for locally available models: "cli" or "server".
    #[serde(default = "default_mode")]
    pub llama_mode: String,
    /// Optional system prompt, forwarded as the leading message.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Flat error body; every failure renders this way.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
