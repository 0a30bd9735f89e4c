use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use super::{AuthServiceError, JwtManager, TokenPair};
use crate::domain::user::{User, UserStore};

/// Signing secrets and lifetimes for the two token kinds
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Issues, rotates and revokes the access/refresh token pair of a user.
///
/// Each user has at most one current refresh token, stored on the user record. A refresh
/// token is accepted for renewal only while it is that stored value, so a rotated-away
/// token is rejected even before it expires.
pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    access: JwtManager,
    refresh: JwtManager,
}

impl AuthService {
    pub fn new(user_store: Arc<dyn UserStore>, config: TokenConfig) -> Self {
        Self {
            user_store,
            access: JwtManager::new(&config.access_secret, config.access_ttl),
            refresh: JwtManager::new(&config.refresh_secret, config.refresh_ttl),
        }
    }

    /// Issue a new pair for the user and make its refresh token the current one
    pub async fn issue(&self, user: &User) -> Result<TokenPair, AuthServiceError> {
        let pair = self.sign_pair(user.id)?;

        self.user_store
            .set_refresh_token(user.id, &pair.refresh_token)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to store refresh token");
                AuthServiceError::Issuance(e.to_string())
            })?;

        tracing::info!(user_id = %user.id, "Issued token pair");
        Ok(pair)
    }

    /// Exchange the current refresh token for a new pair
    pub async fn validate_and_rotate(&self, presented: &str) -> Result<TokenPair, AuthServiceError> {
        let user_id = self.refresh.extract_user_id(presented).map_err(|e| {
            tracing::debug!(error = %e, "Refresh token failed verification");
            AuthServiceError::InvalidRefreshToken
        })?;

        let user = self
            .user_store
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthServiceError::Dependency(e.to_string()))?
            .ok_or(AuthServiceError::InvalidRefreshToken)?;

        if user.refresh_token.as_deref() != Some(presented) {
            tracing::warn!(user_id = %user.id, "Rejected stale or revoked refresh token");
            return Err(AuthServiceError::RefreshTokenReused);
        }

        let pair = self.sign_pair(user.id)?;

        // Conditional write: a concurrent rotation that already replaced the token wins.
        let swapped = self
            .user_store
            .swap_refresh_token(user.id, presented, &pair.refresh_token)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to rotate refresh token");
                AuthServiceError::Issuance(e.to_string())
            })?;

        if !swapped {
            tracing::warn!(user_id = %user.id, "Lost refresh token rotation race");
            return Err(AuthServiceError::RefreshTokenReused);
        }

        tracing::info!(user_id = %user.id, "Rotated refresh token");
        Ok(pair)
    }

    /// End the user's refresh session
    pub async fn revoke(&self, user_id: Uuid) -> Result<(), AuthServiceError> {
        self.user_store
            .clear_refresh_token(user_id)
            .await
            .map_err(|e| AuthServiceError::Dependency(e.to_string()))?;

        tracing::info!(user_id = %user_id, "Revoked refresh session");
        Ok(())
    }

    /// Verify an access token and return the user ID it was issued for
    pub fn verify_access(&self, presented: &str) -> Result<Uuid, AuthServiceError> {
        self.access.extract_user_id(presented).map_err(|e| {
            tracing::debug!(error = %e, "Access token failed verification");
            AuthServiceError::Unauthorized("Invalid access token".to_string())
        })
    }

    fn sign_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthServiceError> {
        let access_token = self
            .access
            .generate_token(user_id)
            .map_err(|e| AuthServiceError::Issuance(e.to_string()))?;
        let refresh_token = self
            .refresh
            .generate_token(user_id)
            .map_err(|e| AuthServiceError::Issuance(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
