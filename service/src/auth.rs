//! API-key authentication against the credential store.
//!
//! The store is an external key-value service; the gateway only ever issues
//! `GET api_key:<key>` lookups through the [`ApiKeyStore`] seam, so tests and
//! local development can swap in a fixed map.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Key prefix under which identities are stored.
const KEY_PREFIX: &str = "api_key:";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing API key")]
    MissingKey,
    #[error("Invalid API key")]
    InvalidKey,
    #[error("credential store unavailable: {0}")]
    Store(String),
}

type LookupFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<String>, AuthError>> + Send + 'a>>;

/// Object-safe credential lookup seam.
pub trait ApiKeyStore: Send + Sync {
    /// Identity stored for `api_key`, or `None` when the key is unknown.
    fn lookup<'a>(&'a self, api_key: &'a str) -> LookupFuture<'a>;
}

/// Authenticate one request: a known key yields its identity.
pub async fn authenticate(
    store: &dyn ApiKeyStore,
    api_key: Option<&str>,
) -> Result<String, AuthError> {
    let key = api_key.map(str::trim).filter(|k| !k.is_empty());
    let key = key.ok_or(AuthError::MissingKey)?;
    match store.lookup(key).await? {
        Some(identity) => Ok(identity),
        None => Err(AuthError::InvalidKey),
    }
}

/// Redis-backed store (`GET api_key:<key>`).
pub struct RedisKeyStore {
    connection: redis::aio::ConnectionManager,
}

impl RedisKeyStore {
    /// Connect eagerly so a bad URL fails at startup, not per request.
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }
}

impl ApiKeyStore for RedisKeyStore {
    fn lookup<'a>(&'a self, api_key: &'a str) -> LookupFuture<'a> {
        Box::pin(async move {
            // ConnectionManager multiplexes; cloning is the intended use.
            let mut conn = self.connection.clone();
            let value: Option<String> = redis::cmd("GET")
                .arg(format!("{KEY_PREFIX}{api_key}"))
                .query_async(&mut conn)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;
            Ok(value)
        })
    }
}

/// Fixed key-to-identity map for tests and local development.
#[derive(Debug, Default)]
pub struct StaticKeyStore {
    keys: HashMap<String, String>,
}

impl StaticKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, api_key: impl Into<String>, identity: impl Into<String>) -> Self {
        self.keys.insert(api_key.into(), identity.into());
        self
    }
}

impl ApiKeyStore for StaticKeyStore {
    fn lookup<'a>(&'a self, api_key: &'a str) -> LookupFuture<'a> {
        Box::pin(async move { Ok(self.keys.get(api_key).cloned()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StaticKeyStore {
        StaticKeyStore::new().with_key("secret-123", "alice")
    }

    #[tokio::test]
    async fn known_key_yields_identity() {
        let identity = authenticate(&store(), Some("secret-123")).await.unwrap();
        assert_eq!(identity, "alice");
    }

    #[tokio::test]
    async fn absent_key_is_missing() {
        let err = authenticate(&store(), None).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingKey));
        assert_eq!(err.to_string(), "Missing API key");
    }

    #[tokio::test]
    async fn blank_key_is_missing() {
        let err = authenticate(&store(), Some("   ")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingKey));
    }

    #[tokio::test]
    async fn unknown_key_is_invalid() {
        let err = authenticate(&store(), Some("wrong")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidKey));
        assert_eq!(err.to_string(), "Invalid API key");
    }
}
