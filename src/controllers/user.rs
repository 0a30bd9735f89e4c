use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Extension, Json,
};
use std::sync::Arc;

use super::extract::{json_body, read_form};
use crate::{
    domain::{
        shared::ApiResponse,
        user::{RegisterInput, UpdateAccountRequest, UserDto, UserService},
    },
    error::AppResult,
    infrastructure::auth::AuthUser,
};

pub struct UserController {
    user_service: Arc<UserService>,
}

impl UserController {
    pub fn new(user_service: Arc<UserService>) -> Self {
        Self { user_service }
    }

    /// POST /api/v1/users/register - Multipart form with `avatar` and optional `coverImage`
    pub async fn register(
        State(controller): State<Arc<UserController>>,
        payload: Result<Multipart, MultipartRejection>,
    ) -> AppResult<ApiResponse<UserDto>> {
        let mut form = read_form(payload).await?;
        let input = RegisterInput {
            username: form.text("username"),
            full_name: form.text("fullName"),
            email: form.text("email"),
            password: form.text("password"),
            avatar: form.take_file("avatar"),
            cover_image: form.take_file("coverImage"),
        };

        let user = controller.user_service.register(input).await?;
        Ok(ApiResponse::created(user, "User registered successfully!"))
    }

    /// GET /api/v1/users/current-user
    pub async fn current_user(
        State(controller): State<Arc<UserController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<ApiResponse<UserDto>> {
        let user = controller
            .user_service
            .current_user(auth_user.user_id)
            .await?;
        Ok(ApiResponse::ok(user, "Current user fetched successfully!"))
    }

    /// PATCH /api/v1/users/update-account - Update full name and email
    pub async fn update_account(
        State(controller): State<Arc<UserController>>,
        Extension(auth_user): Extension<AuthUser>,
        payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
    ) -> AppResult<ApiResponse<UserDto>> {
        let request = json_body(payload)?;
        let user = controller
            .user_service
            .update_account_details(auth_user.user_id, request)
            .await?;
        Ok(ApiResponse::ok(user, "Account details updated successfully!"))
    }

    /// PATCH /api/v1/users/avatar
    pub async fn update_avatar(
        State(controller): State<Arc<UserController>>,
        Extension(auth_user): Extension<AuthUser>,
        payload: Result<Multipart, MultipartRejection>,
    ) -> AppResult<ApiResponse<UserDto>> {
        let mut form = read_form(payload).await?;
        let user = controller
            .user_service
            .update_avatar(auth_user.user_id, form.take_file("avatar"))
            .await?;
        Ok(ApiResponse::ok(user, "Avatar image updated successfully"))
    }

    /// PATCH /api/v1/users/cover-image
    pub async fn update_cover_image(
        State(controller): State<Arc<UserController>>,
        Extension(auth_user): Extension<AuthUser>,
        payload: Result<Multipart, MultipartRejection>,
    ) -> AppResult<ApiResponse<UserDto>> {
        let mut form = read_form(payload).await?;
        let user = controller
            .user_service
            .update_cover_image(auth_user.user_id, form.take_file("coverImage"))
            .await?;
        Ok(ApiResponse::ok(user, "Cover image updated successfully"))
    }
}
