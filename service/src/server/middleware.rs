//! API-key authentication layer.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::auth::{authenticate, ApiKeyStore, AuthError};
use crate::protocol::ErrorResponse;

/// Authenticated principal, stored in request extensions for handlers.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

/// Looks up the `X-API-KEY` header in the credential store and injects
/// [`Identity`] on success.
pub async fn auth_middleware(
    State(store): State<Arc<dyn ApiKeyStore>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let api_key = req
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    match authenticate(store.as_ref(), api_key).await {
        Ok(identity) => {
            req.extensions_mut().insert(Identity(identity));
            next.run(req).await
        }
        Err(err @ (AuthError::MissingKey | AuthError::InvalidKey)) => unauthorized(&err),
        Err(AuthError::Store(cause)) => {
            error!(error = %cause, "credential store lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("credential store unavailable: {cause}"),
                }),
            )
                .into_response()
        }
    }
}

/// The "401 Unauthorized: <reason>" wrapping is part of the wire contract;
/// clients match on the full string.
fn unauthorized(err: &AuthError) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: format!("401 Unauthorized: {err}"),
        }),
    )
        .into_response()
}
