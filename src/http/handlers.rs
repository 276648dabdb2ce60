//! Axum HTTP handlers for the web server
//!
//! Provides the public health descriptor, both MCP framings, and the fallback for
//! unknown paths.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{
        sse::{KeepAlive, KeepAliveStream, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{query_param, API_KEY_QUERY_PARAM};
use crate::errors::AppError;
use crate::mcp::rpc::{json_rpc_error, PARSE_ERROR};
use crate::mcp::server::dispatch_payload;
use crate::mcp::sse::SessionStream;
use crate::AppState;

pub const HEALTH_NAME: &str = "Secured Calculator MCP Server";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub auth: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        name: HEALTH_NAME,
        version: env!("CARGO_PKG_VERSION"),
        auth: "required",
    })
}

pub async fn not_found() -> AppError {
    AppError::not_found("Not found")
}

fn parse_payload(body: &Bytes) -> Result<Value, Value> {
    serde_json::from_slice(body).map_err(|_| json_rpc_error(None, PARSE_ERROR, "Parse error"))
}

pub async fn mcp_endpoint(body: Bytes) -> Response {
    let payload = match parse_payload(&body) {
        Ok(value) => value,
        Err(error) => return (StatusCode::OK, Json(error)).into_response(),
    };

    match dispatch_payload(payload) {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn sse_connect(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Sse<KeepAliveStream<SessionStream>>, AppError> {
    let api_key = query_param(&uri, API_KEY_QUERY_PARAM);
    let (_session_id, stream) = state.sse_sessions.open(api_key.as_deref())?;
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub async fn sse_message(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        return Err(AppError::bad_request(
            "missing_session_id",
            "sessionId query parameter is required",
        ));
    };

    // Fail before dispatching when the session is already gone.
    state.sse_sessions.deliver(&session_id, None).await?;

    let response = match parse_payload(&body) {
        Ok(payload) => dispatch_payload(payload),
        Err(error) => Some(error),
    };
    state
        .sse_sessions
        .deliver(&session_id, response.as_ref())
        .await?;

    Ok((StatusCode::ACCEPTED, "Accepted").into_response())
}
