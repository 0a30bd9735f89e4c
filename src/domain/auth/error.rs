use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Bad signature, expired, malformed, or the identity no longer exists
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    /// Cryptographically valid but no longer the stored token
    #[error("Refresh token is expired or used")]
    RefreshTokenReused,
    #[error("{0}")]
    Unauthorized(String),
    /// Signing or persisting a new pair failed
    #[error("token issuance failed: {0}")]
    Issuance(String),
    /// The user store failed while checking or revoking a session
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidRefreshToken => AppError::InvalidRefreshToken,
            AuthServiceError::RefreshTokenReused => AppError::RefreshTokenReused,
            AuthServiceError::Unauthorized(msg) => AppError::Unauthorized(msg),
            AuthServiceError::Issuance(detail) => AppError::TokenIssuance(detail),
            AuthServiceError::Dependency(detail) => AppError::Internal(detail),
        }
    }
}
