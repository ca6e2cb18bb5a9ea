//! Backend routing and fallback policy.
//!
//! A locally present artifact is assumed to be intentionally placed for the
//! requested execution path, so a local backend's failure is NOT retried
//! against the managed service. The single deterministic path keeps request
//! latency bounded by one backend's timeout. The managed backend serves only
//! models with no local artifact.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::locator::ModelLocator;
use crate::metrics;
use crate::providers::{BackendError, ChatProviderDyn};

/// Caller-selected execution path for locally available models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlamaMode {
    Cli,
    Server,
}

impl FromStr for LlamaMode {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, RouteError> {
        match s {
            "cli" => Ok(Self::Cli),
            "server" => Ok(Self::Server),
            other => Err(RouteError::InvalidMode(other.to_string())),
        }
    }
}

/// One chat request after defaults have been applied.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub model: String,
    pub content: String,
    pub llama_mode: String,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Missing prompt content")]
    MissingContent,
    #[error("Invalid llama_mode: '{0}'. Must be 'cli' or 'server'")]
    InvalidMode(String),
    #[error("llama-server URL is not configured")]
    ServerUrlNotConfigured,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Picks one backend per request and runs it.
pub struct ChatRouter {
    locator: ModelLocator,
    process: Arc<dyn ChatProviderDyn>,
    server: Option<Arc<dyn ChatProviderDyn>>,
    managed: Arc<dyn ChatProviderDyn>,
}

impl ChatRouter {
    pub fn new(
        locator: ModelLocator,
        process: Arc<dyn ChatProviderDyn>,
        server: Option<Arc<dyn ChatProviderDyn>>,
        managed: Arc<dyn ChatProviderDyn>,
    ) -> Self {
        Self {
            locator,
            process,
            server,
            managed,
        }
    }

    /// Route one request.
    ///
    /// Validation runs strictly before any backend or locator work: blank
    /// content first, then the mode string. Backend selection:
    /// local artifact + cli → process; local artifact + server → HTTP (a
    /// missing URL is a configuration error, not a fallback); no local
    /// artifact → managed, whatever the mode says.
    pub async fn route(&self, request: &RouteRequest) -> Result<String, RouteError> {
        if request.content.trim().is_empty() {
            return Err(RouteError::MissingContent);
        }
        let mode: LlamaMode = request.llama_mode.parse()?;

        let provider = if self.locator.is_available(&request.model) {
            match mode {
                LlamaMode::Cli => Arc::clone(&self.process),
                LlamaMode::Server => match &self.server {
                    Some(server) => Arc::clone(server),
                    None => return Err(RouteError::ServerUrlNotConfigured),
                },
            }
        } else {
            Arc::clone(&self.managed)
        };

        info!(
            model = %request.model,
            mode = ?mode,
            backend = provider.name(),
            "routing chat request"
        );

        let timer = metrics::start_request_timer(provider.name());
        match provider
            .chat_dyn(
                &request.model,
                &request.content,
                request.system_prompt.as_deref(),
            )
            .await
        {
            Ok(answer) => {
                timer.success();
                Ok(answer)
            }
            Err(e) => {
                warn!(
                    model = %request.model,
                    backend = provider.name(),
                    error = %e,
                    "backend call failed"
                );
                timer.failure();
                Err(e.into())
            }
        }
    }
}
