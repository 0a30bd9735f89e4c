use axum::{body::Bytes, extract::rejection::JsonRejection, extract::State, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use std::sync::Arc;

use super::extract::json_body;
use crate::{
    domain::{
        auth::{
            AuthService, ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest,
            TokenPair,
        },
        shared::ApiResponse,
        user::UserService,
    },
    error::{AppError, AppResult},
    infrastructure::auth::{token_from_jar, AuthUser, CookieSettings, REFRESH_TOKEN_COOKIE},
};

pub struct AuthController {
    user_service: Arc<UserService>,
    auth_service: Arc<AuthService>,
    cookies: CookieSettings,
}

impl AuthController {
    pub fn new(
        user_service: Arc<UserService>,
        auth_service: Arc<AuthService>,
        cookies: CookieSettings,
    ) -> Self {
        Self {
            user_service,
            auth_service,
            cookies,
        }
    }

    /// POST /api/v1/users/login - Check credentials, set token cookies
    pub async fn login(
        State(controller): State<Arc<AuthController>>,
        jar: CookieJar,
        payload: Result<Json<LoginRequest>, JsonRejection>,
    ) -> AppResult<(CookieJar, ApiResponse<LoginResponse>)> {
        let request = json_body(payload)?;
        let response = controller.user_service.login(request).await?;

        let jar = controller.cookies.set_tokens(
            jar,
            &TokenPair {
                access_token: response.access_token.clone(),
                refresh_token: response.refresh_token.clone(),
            },
        );

        Ok((jar, ApiResponse::ok(response, "User logged in successfully!")))
    }

    /// POST /api/v1/users/logout - End the refresh session, clear cookies
    pub async fn logout(
        State(controller): State<Arc<AuthController>>,
        jar: CookieJar,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<(CookieJar, ApiResponse<Value>)> {
        controller.auth_service.revoke(auth_user.user_id).await?;

        let jar = controller.cookies.clear_tokens(jar);
        Ok((jar, ApiResponse::ok(json!({}), "User logged out successfully!")))
    }

    /// POST /api/v1/users/refresh-token - Rotate the refresh token.
    ///
    /// The token comes from the `refreshToken` cookie or the `refreshToken` body field.
    pub async fn refresh_token(
        State(controller): State<Arc<AuthController>>,
        jar: CookieJar,
        body: Bytes,
    ) -> AppResult<(CookieJar, ApiResponse<TokenPair>)> {
        let presented = token_from_jar(&jar, REFRESH_TOKEN_COOKIE)
            .or_else(|| refresh_token_from_body(&body))
            .ok_or_else(|| AppError::Unauthorized("Unauthorized request".to_string()))?;

        let tokens = controller
            .auth_service
            .validate_and_rotate(&presented)
            .await?;

        let jar = controller.cookies.set_tokens(jar, &tokens);
        Ok((jar, ApiResponse::ok(tokens, "Access token refreshed!")))
    }

    /// POST /api/v1/users/change-password - Requires the old password; ends the refresh session
    pub async fn change_password(
        State(controller): State<Arc<AuthController>>,
        jar: CookieJar,
        Extension(auth_user): Extension<AuthUser>,
        payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
    ) -> AppResult<(CookieJar, ApiResponse<Value>)> {
        let request = json_body(payload)?;
        controller
            .user_service
            .change_password(auth_user.user_id, request)
            .await?;

        let jar = controller.cookies.clear_tokens(jar);
        Ok((jar, ApiResponse::ok(json!({}), "Password changed successfully!")))
    }
}

fn refresh_token_from_body(body: &Bytes) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice::<RefreshTokenRequest>(body)
        .ok()
        .and_then(|r| r.refresh_token)
        .filter(|t| !t.trim().is_empty())
}
