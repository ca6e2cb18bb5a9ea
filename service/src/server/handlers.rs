//! Request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use crate::metrics;
use crate::protocol::{ChatParams, ErrorResponse, HealthResponse};
use crate::router::{ChatRouter, RouteError, RouteRequest};
use crate::server::middleware::Identity;

pub struct AppState {
    pub chat_router: Arc<ChatRouter>,
    pub default_model: String,
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn metrics() -> impl IntoResponse {
    Json(metrics::snapshot())
}

/// `POST /chat`: route one prompt to a backend. The success body is a bare
/// JSON string.
///
/// The extractor result is handled here so an unparseable body still renders
/// as the flat `{"error": …}` shape like every other failure.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<ChatParams>, JsonRejection>,
) -> Response {
    let params = match payload {
        Ok(Json(params)) => params,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid request body: {rejection}"),
                }),
            )
                .into_response();
        }
    };

    let request = RouteRequest {
        model: params
            .model
            .unwrap_or_else(|| state.default_model.clone()),
        content: params.content,
        llama_mode: params.llama_mode,
        system_prompt: params.system_prompt,
    };

    info!(user = %identity.0, model = %request.model, "chat request");

    match state.chat_router.route(&request).await {
        Ok(answer) => Json(answer).into_response(),
        Err(err) => route_error(&err),
    }
}

/// Map a routing failure to its status class; the body is always the flat
/// `{"error": …}` shape.
fn route_error(err: &RouteError) -> Response {
    let status = match err {
        RouteError::MissingContent | RouteError::InvalidMode(_) => StatusCode::BAD_REQUEST,
        RouteError::ServerUrlNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        RouteError::Backend(_) => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}
