//! Command-line client: post one prompt to a running gateway.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(version, about = "Send a prompt to a ModelGate gateway")]
struct Args {
    /// Gateway base URL
    #[arg(long, default_value = "http://localhost:8600", env = "MODELGATE_URL")]
    gateway: String,

    /// API key, looked up by the gateway in its credential store
    #[arg(long, env = "MODELGATE_API_KEY")]
    api_key: String,

    /// Model to query (gateway default when omitted)
    #[arg(long)]
    model: Option<String>,

    /// Execution path for local models: "cli" or "server"
    #[arg(long, default_value = "cli")]
    mode: String,

    /// Optional system prompt
    #[arg(long)]
    system_prompt: Option<String>,

    /// The prompt itself
    #[arg(required = true)]
    prompt: Vec<String>,
}

#[derive(Serialize)]
struct ChatParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    content: String,
    llama_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<&'a str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let content = args.prompt.join(" ");
    if content.trim().is_empty() {
        bail!("empty prompt");
    }

    let body = ChatParams {
        model: args.model.as_deref(),
        content,
        llama_mode: &args.mode,
        system_prompt: args.system_prompt.as_deref(),
    };

    let url = format!("{}/chat", args.gateway.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .header("X-API-KEY", &args.api_key)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = response.status();
    let text = response.text().await.context("failed to read response body")?;

    if !status.is_success() {
        bail!("gateway returned {status}: {text}");
    }

    // The success body is a bare JSON string.
    let answer: String = serde_json::from_str(&text).unwrap_or(text);
    println!("{answer}");
    Ok(())
}
