use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token is expired or used")]
    RefreshTokenReused,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error body: `{ statusCode, message, success: false }`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub success: bool,
}

const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong";
const TOKEN_ISSUANCE_MESSAGE: &str =
    "Something went wrong while generating refresh and access token.";

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidRefreshToken | Self::RefreshTokenReused => {
                StatusCode::UNAUTHORIZED
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Database(_) | Self::TokenIssuance(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to clients. Server-side failures never leak their cause.
    pub fn public_message(&self) -> String {
        match self {
            Self::TokenIssuance(_) => TOKEN_ISSUANCE_MESSAGE.to_string(),
            Self::Database(_) | Self::Internal(_) => GENERIC_INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status_code: self.status_code().as_u16(),
            message: self.public_message(),
            success: false,
        }
    }
}

/// Implement IntoResponse for automatic conversion in handlers
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error = %self,
                status = %status.as_u16(),
                "Request failed"
            );
        } else {
            tracing::warn!(
                error = %self,
                status = %status.as_u16(),
                "Request rejected"
            );
        }

        (status, Json(self.to_response())).into_response()
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
