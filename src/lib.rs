use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};

pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;

use auth::ApiKey;
use mcp::sse::{SseSessions, SSE_MESSAGE_PATH, SSE_PATH};

#[derive(Clone)]
pub struct AppState {
    pub api_key: ApiKey,
    pub sse_sessions: SseSessions,
}

impl AppState {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
            sse_sessions: SseSessions::new(),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", any(http::handlers::health))
        .route("/health", any(http::handlers::health))
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .route(SSE_PATH, get(http::handlers::sse_connect))
        .route(SSE_MESSAGE_PATH, post(http::handlers::sse_message))
        .fallback(http::handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
