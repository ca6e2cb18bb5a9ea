//! One-shot `llama-cli` subprocess backend.
//!
//! Each request spawns a fresh process: model load, single completion, exit.
//! Expensive, but there is no daemon to babysit and a wedged engine can
//! always be killed at the timeout boundary.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::locator::ModelLocator;
use crate::providers::{BackendError, ChatProvider, MAX_COMPLETION_TOKENS};

/// Answer returned when the engine exits cleanly but prints nothing.
const EMPTY_OUTPUT_PLACEHOLDER: &str = "No response generated.";

/// Settings for the subprocess backend.
#[derive(Debug, Clone)]
pub struct LlamaCliConfig {
    /// Path to the `llama-cli` binary.
    pub cli_path: PathBuf,
    /// Layers offloaded to GPU (`--n-gpu-layers`).
    pub gpu_layers: u32,
    /// Hard wall-clock limit for one invocation.
    pub timeout: Duration,
    /// Limit applied to models named in `large_models`. Huge quantised
    /// weights routinely need more than the default budget just to load.
    pub large_model_timeout: Duration,
    /// Models that get the large-model timeout.
    pub large_models: Vec<String>,
}

pub struct LlamaCliProvider {
    config: LlamaCliConfig,
    locator: ModelLocator,
}

impl LlamaCliProvider {
    pub fn new(config: LlamaCliConfig, locator: ModelLocator) -> Self {
        Self { config, locator }
    }

    fn timeout_for(&self, model: &str) -> Duration {
        if self.config.large_models.iter().any(|name| name == model) {
            self.config.large_model_timeout
        } else {
            self.config.timeout
        }
    }

    fn build_command(&self, artifact: &Path, content: &str, system_prompt: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.config.cli_path);
        cmd.arg("-m")
            .arg(artifact)
            .arg("--n-gpu-layers")
            .arg(self.config.gpu_layers.to_string())
            .arg("-n")
            .arg(MAX_COMPLETION_TOKENS.to_string())
            .arg("--single-turn")
            .arg("--no-display-prompt");
        if let Some(prompt) = system_prompt {
            cmd.arg("--system-prompt").arg(prompt);
        }
        cmd.arg("-p").arg(content);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Dropping the wait future at the timeout must take the child with it.
        cmd.kill_on_drop(true);
        cmd
    }
}

impl ChatProvider for LlamaCliProvider {
    fn name(&self) -> &'static str {
        "llama-cli"
    }

    async fn chat(
        &self,
        model: &str,
        content: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, BackendError> {
        // Re-resolved here even though the router already checked: the
        // artifact can disappear between the availability check and the run.
        let artifact = self
            .locator
            .resolve(model)
            .ok_or_else(|| BackendError::ModelNotFound(model.to_string()))?;

        let timeout = self.timeout_for(model);
        let mut cmd = self.build_command(&artifact, content, system_prompt);

        let child = cmd.spawn().map_err(|e| BackendError::Process {
            model: model.to_string(),
            stderr: format!("failed to launch {}: {e}", self.config.cli_path.display()),
        })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(BackendError::Process {
                    model: model.to_string(),
                    stderr: e.to_string(),
                });
            }
            Err(_) => {
                return Err(BackendError::Timeout {
                    model: model.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BackendError::Process {
                model: model.to_string(),
                stderr,
            });
        }

        let answer = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if answer.is_empty() {
            return Ok(EMPTY_OUTPUT_PLACEHOLDER.to_string());
        }
        Ok(answer)
    }
}
