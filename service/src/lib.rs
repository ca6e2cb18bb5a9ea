//! ModelGate service: an authenticated routing gateway in front of local
//! llama.cpp backends with a managed Ollama fallback.
//!
//! Request path: HTTP endpoint → API-key auth (Redis) → chat router →
//! {llama-cli | llama-server | ollama} → bare-string answer.

pub mod auth;
pub mod config;
pub mod locator;
pub mod metrics;
pub mod protocol;
pub mod providers;
pub mod router;
pub mod server;
