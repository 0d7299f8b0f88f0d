//! API errors and their JSON rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orderdesk_common::ValidationErrors;
use orderdesk_store::StoreError;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

pub const MSG_INVALID_DATA: &str = "Dados inválidos.";
pub const MSG_INVALID_CREDENTIALS: &str = "Credenciais inválidas.";
pub const MSG_UNAUTHENTICATED: &str = "Não autenticado.";
pub const MSG_ORDER_NOT_FOUND: &str = "Pedido não encontrado.";
pub const MSG_USER_NOT_FOUND: &str = "Usuário não encontrado";
pub const MSG_INTERNAL: &str = "Erro interno do servidor.";

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Field-level validation failure (422).
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Unknown email or wrong password (422).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, unknown or revoked bearer token (401).
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("order not found")]
    OrderNotFound,

    #[error("user not found")]
    UserNotFound,

    /// Anything else (500). The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidCredentials => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::OrderNotFound | ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            ApiError::Validation(details) => json!({
                "error": MSG_INVALID_DATA,
                "details": details,
            }),
            ApiError::InvalidCredentials => json!({
                "error": MSG_INVALID_CREDENTIALS,
                "details": ValidationErrors::single("email", MSG_INVALID_CREDENTIALS),
            }),
            ApiError::Unauthenticated => json!({ "error": MSG_UNAUTHENTICATED }),
            ApiError::OrderNotFound => json!({ "error": MSG_ORDER_NOT_FOUND }),
            ApiError::UserNotFound => json!({ "error": MSG_USER_NOT_FOUND }),
            ApiError::Internal(_) => json!({ "error": MSG_INTERNAL }),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<orderdesk_auth::AuthError> for ApiError {
    fn from(err: orderdesk_auth::AuthError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(error = %detail, "Request failed");
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type for handlers and services.
pub type ApiResult<T> = Result<T, ApiError>;
