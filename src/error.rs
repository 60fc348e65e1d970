//! Error taxonomy shared by the auth core and the listing handlers.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::auth::jwt::TokenError;

/// Errors a request can terminate with.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bearer token missing, malformed, expired or badly signed.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Privileged signup without a valid product key.
    #[error("unauthorized")]
    Unauthorized,

    /// Role or ownership mismatch.
    #[error("access denied")]
    Forbidden,

    #[error("user already exists")]
    DuplicateUser,

    /// Unknown email or wrong password; the two are never told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Failures raised by the persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("record already exists")]
    Conflict,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidToken | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DuplicateUser => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to the client.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidToken => "Unauthenticated".to_string(),
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Forbidden => "Access denied".to_string(),
            AppError::DuplicateUser => "Email already registered".to_string(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound => "Resource not found".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            // only the user table carries a uniqueness constraint
            StoreError::Conflict => AppError::DuplicateUser,
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e).context("store failure")),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Encode(e) => AppError::Internal(anyhow::Error::new(e).context("sign token")),
            _ => AppError::InvalidToken,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
            },
        };

        if status.is_server_error() {
            error!(code = body.error.code, error = ?self, "request failed");
        } else {
            debug!(code = body.error.code, error = %self, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}
