//! HTTP surface of the gateway.

pub mod handlers;
pub mod logging;
pub mod middleware;

use std::sync::Arc;

use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::ApiKeyStore;
use crate::router::ChatRouter;

use self::handlers::AppState;

/// Build the gateway router: `/health` and `/metrics` are public, `/chat`
/// sits behind the API-key layer.
pub fn build_router(
    chat_router: Arc<ChatRouter>,
    key_store: Arc<dyn ApiKeyStore>,
    default_model: String,
) -> Router {
    let state = Arc::new(AppState {
        chat_router,
        default_model,
    });

    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics));

    let protected = Router::new()
        .route("/chat", post(handlers::chat))
        .layer(axum_middleware::from_fn_with_state(
            key_store,
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(axum_middleware::from_fn(logging::logging_middleware))
        .with_state(state)
}
