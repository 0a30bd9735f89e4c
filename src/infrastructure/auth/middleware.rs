use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

use super::cookies::{token_from_jar, ACCESS_TOKEN_COOKIE};
use crate::{
    domain::{auth::AuthService, user::UserStore},
    error::AppError,
};

/// User context injected into request extensions after authentication
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

pub type AuthState = (Arc<dyn UserStore>, Arc<AuthService>);

/// Authentication middleware.
///
/// Reads the access token from the `accessToken` cookie, falling back to an
/// `Authorization: Bearer` header.
pub async fn auth_middleware(
    State((user_store, auth_service)): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from_jar(&jar, ACCESS_TOKEN_COOKIE)
        .or_else(|| bearer_token(&request))
        .ok_or_else(|| AppError::Unauthorized("Unauthorized request".to_string()))?;

    let user_id = auth_service.verify_access(&token)?;

    // Verify user still exists
    let user = user_store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid access token".to_string()))?;

    request
        .extensions_mut()
        .insert(AuthUser { user_id: user.id });

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
