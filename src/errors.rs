use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const UNAUTHORIZED_MESSAGE: &str = "Valid API key required. Please provide the key via Authorization header, X-API-Key header, or api_key query parameter.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized: {message}")]
    Unauthorized { message: &'static str },
    #[error("bad request: {message}")]
    BadRequest {
        code: &'static str,
        message: &'static str,
    },
    #[error("not found: {message}")]
    NotFound { message: &'static str },
    #[error("internal error")]
    Internal { message: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            message: UNAUTHORIZED_MESSAGE,
        }
    }

    pub fn bad_request(code: &'static str, message: &'static str) -> Self {
        Self::BadRequest { code, message }
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::NotFound { message }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(ErrorResponse {
                    error: "Unauthorized",
                    message: message.to_string(),
                }),
            )
                .into_response(),
            Self::BadRequest { message, .. } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Bad Request",
                    message: message.to_string(),
                }),
            )
                .into_response(),
            Self::NotFound { message } => (StatusCode::NOT_FOUND, message).into_response(),
            Self::Internal { message } => {
                tracing::error!(error = %message, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Internal Server Error",
                        message: "internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
