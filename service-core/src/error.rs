use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Authentication error: {0}")]
    AuthError(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Credits store unavailable")]
    CreditsUnavailable,

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            code: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, code, error_message, details, retry_after) = match self {
            AppError::ValidationError(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Validation error".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::BadRequest(err) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                err.to_string(),
                None,
                None,
            ),
            AppError::NotFound(err) => (
                StatusCode::NOT_FOUND,
                "not_found",
                err.to_string(),
                None,
                None,
            ),
            AppError::Unauthorized(err) => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                err.to_string(),
                None,
                None,
            ),
            AppError::Forbidden(err) => (
                StatusCode::FORBIDDEN,
                "forbidden",
                err.to_string(),
                None,
                None,
            ),
            AppError::AuthError(err) => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                err.to_string(),
                None,
                None,
            ),
            AppError::Conflict(err) => (
                StatusCode::CONFLICT,
                "conflict",
                err.to_string(),
                None,
                None,
            ),
            AppError::TooManyRequests(msg, retry) => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                msg,
                None,
                retry,
            ),
            AppError::InsufficientCredits => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                "Not enough credits remaining - upgrade to continue".to_string(),
                None,
                None,
            ),
            AppError::PaymentRequired(msg) => (
                StatusCode::PAYMENT_REQUIRED,
                "payment_required",
                msg,
                None,
                None,
            ),
            AppError::CreditsUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "credits_unavailable",
                "Credit balance is temporarily unavailable".to_string(),
                None,
                None,
            ),
            AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::BadGateway(_) => (
                StatusCode::BAD_GATEWAY,
                "upstream_failure",
                "Upstream service failed - please try again".to_string(),
                None,
                None,
            ),
            AppError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "Service unavailable".to_string(),
                None,
                None,
            ),
            AppError::DatabaseError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Database error".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                "Configuration error".to_string(),
                Some(err.to_string()),
                None,
            ),
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                error: error_message,
                code,
                details,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}
