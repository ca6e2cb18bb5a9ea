//! Startup configuration.
//!
//! Everything is read once at startup through clap; nothing reads the
//! environment after this struct is constructed.

use std::path::PathBuf;

use clap::Parser;

/// ModelGate: authenticated routing gateway for local and managed LLM
/// backends.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Listen address (":8600" binds all interfaces)
    #[arg(long, default_value = ":8600", env = "MODELGATE_ADDR")]
    pub addr: String,

    /// Log format: "text" or "json"
    #[arg(long, default_value = "text", env = "MODELGATE_LOG_FORMAT")]
    pub log_format: String,

    /// Model used when a request does not name one
    #[arg(long, default_value = "deepseek-coder-v2:latest", env = "MODELGATE_DEFAULT_MODEL")]
    pub default_model: String,

    /// Directory holding one subdirectory of GGUF files per model
    #[arg(long, default_value = "/data1/GGUF", env = "MODELGATE_MODEL_BASE_DIR")]
    pub model_base_dir: PathBuf,

    /// llama-cli binary used for cli-mode requests
    #[arg(
        long,
        default_value = "/data1/llama.cpp/bin/llama-cli",
        env = "MODELGATE_LLAMA_CLI_PATH"
    )]
    pub llama_cli_path: PathBuf,

    /// Layers offloaded to GPU for cli-mode requests
    #[arg(long, default_value_t = 40, env = "MODELGATE_GPU_LAYERS")]
    pub gpu_layers: u32,

    /// llama-server base URL for server-mode requests; bare "host:port" is
    /// accepted. Server mode is rejected when this is unset.
    #[arg(long, env = "LLAMA_SERVER_URL")]
    pub llama_server_url: Option<String>,

    /// Ollama base URL (managed fallback)
    #[arg(long, default_value = "http://localhost:11434", env = "MODELGATE_OLLAMA_URL")]
    pub ollama_url: String,

    /// Credential store connection string (e.g. redis://localhost:6379)
    #[arg(long, env = "MODELGATE_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Wall-clock limit for one llama-cli run, in seconds
    #[arg(long, default_value_t = 300, env = "MODELGATE_CLI_TIMEOUT_SECS")]
    pub cli_timeout_secs: u64,

    /// Limit for models listed in --large-models, in seconds
    #[arg(long, default_value_t = 600, env = "MODELGATE_CLI_TIMEOUT_LARGE_SECS")]
    pub cli_timeout_large_secs: u64,

    /// Comma-separated model names that get the large timeout
    #[arg(long, env = "MODELGATE_LARGE_MODELS")]
    pub large_models: Option<String>,
}

/// Prefix bare "host:port" with "http://"; URLs with an http(s) scheme pass
/// through unchanged.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    // "localhost:8080" parses as a Url with scheme "localhost", so only an
    // explicit http(s) scheme counts as already-normalized.
    match url::Url::parse(trimmed) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
            trimmed.to_string()
        }
        _ => format!("http://{trimmed}"),
    }
}

/// Convert ":8600" to "0.0.0.0:8600"; full addresses pass through.
pub fn normalize_addr(addr: &str) -> String {
    if let Some(port) = addr.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        addr.to_string()
    }
}

/// Parse a comma-separated model list, trimming whitespace and dropping
/// empty entries.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
