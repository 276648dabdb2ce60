use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::auth::is_public_path;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Logs one summary line per request. Only the path is recorded; the query
/// string may carry the API key.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started_at.elapsed().as_millis();

    // Health probes are polled constantly.
    if is_public_path(&path) {
        debug!(method = %method, path = %path, status = status.as_u16(), "health probe");
        return response;
    }

    info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = elapsed_ms,
        "request summary"
    );

    if status.as_u16() == 401 {
        warn!(method = %method, path = %path, "authentication failure");
    }

    response
}
