use std::sync::Arc;
use uuid::Uuid;

use super::{
    password::{hash_password, verify_password},
    NewUser, RegisterInput, UpdateAccountRequest, User, UserDto, UserStore,
};
use crate::{
    domain::{
        auth::{AuthService, ChangePasswordRequest, LoginRequest, LoginResponse},
        media::{MediaStorage, UploadFile, UploadedMedia},
    },
    error::{AppError, AppResult},
};

pub struct UserService {
    user_store: Arc<dyn UserStore>,
    media_storage: Arc<dyn MediaStorage>,
    auth_service: Arc<AuthService>,
}

impl UserService {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        media_storage: Arc<dyn MediaStorage>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self {
            user_store,
            media_storage,
            auth_service,
        }
    }

    /// Create an account from the registration form. The avatar is mandatory.
    pub async fn register(&self, input: RegisterInput) -> AppResult<UserDto> {
        let (username, full_name, email, password) = match (
            non_blank(input.username),
            non_blank(input.full_name),
            non_blank(input.email),
            non_blank(input.password),
        ) {
            (Some(u), Some(f), Some(e), Some(p)) => (u.to_lowercase(), f, e.to_lowercase(), p),
            _ => return Err(AppError::BadRequest("All fields are required!".to_string())),
        };

        if self
            .user_store
            .find_by_username_or_email(Some(&username), Some(&email))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with username or email already exists!".to_string(),
            ));
        }

        let avatar_file = input
            .avatar
            .filter(|f| !f.is_empty())
            .ok_or_else(|| AppError::BadRequest("Avatar is required!".to_string()))?;

        let avatar = self
            .upload(avatar_file)
            .await
            .ok_or_else(|| AppError::BadRequest("Avatar is required!".to_string()))?;

        let cover_image = match input.cover_image.filter(|f| !f.is_empty()) {
            Some(file) => self.upload(file).await.map(|m| m.url).unwrap_or_default(),
            None => String::new(),
        };

        let password_hash = hash_password(&password).await?;

        let user = self
            .user_store
            .create(NewUser {
                username,
                email,
                full_name,
                avatar: avatar.url,
                cover_image,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user.into())
    }

    /// Check credentials and start a new refresh session
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let username = non_blank(request.username).map(|u| u.to_lowercase());
        let email = non_blank(request.email).map(|e| e.to_lowercase());

        if username.is_none() && email.is_none() {
            return Err(AppError::BadRequest(
                "Username or email is required!".to_string(),
            ));
        }

        let user = self
            .user_store
            .find_by_username_or_email(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist!".to_string()))?;

        if !verify_password(&request.password, &user.password_hash).await? {
            tracing::warn!(user_id = %user.id, "Login with wrong password");
            return Err(AppError::Unauthorized(
                "Invalid user credentials!".to_string(),
            ));
        }

        let tokens = self.auth_service.issue(&user).await?;

        Ok(LoginResponse {
            user: user.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Replace the password and end the current refresh session
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        let user = self.find_user(user_id).await?;

        if !verify_password(&request.old_password, &user.password_hash).await? {
            return Err(AppError::BadRequest("Invalid old password".to_string()));
        }
        if request.new_password.trim().is_empty() {
            return Err(AppError::BadRequest(
                "New password is required".to_string(),
            ));
        }

        let password_hash = hash_password(&request.new_password).await?;
        self.user_store
            .update_password(user_id, &password_hash)
            .await?;
        self.auth_service.revoke(user_id).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    pub async fn current_user(&self, user_id: Uuid) -> AppResult<UserDto> {
        Ok(self.find_user(user_id).await?.into())
    }

    pub async fn update_account_details(
        &self,
        user_id: Uuid,
        request: UpdateAccountRequest,
    ) -> AppResult<UserDto> {
        let (full_name, email) = match (non_blank(request.full_name), non_blank(request.email)) {
            (Some(full_name), Some(email)) => (full_name, email.to_lowercase()),
            _ => return Err(AppError::BadRequest("All fields are required".to_string())),
        };

        let user = self
            .user_store
            .update_account_details(user_id, &full_name, &email)
            .await?;
        Ok(user.into())
    }

    pub async fn update_avatar(
        &self,
        user_id: Uuid,
        file: Option<UploadFile>,
    ) -> AppResult<UserDto> {
        let file = file
            .filter(|f| !f.is_empty())
            .ok_or_else(|| AppError::BadRequest("Avatar file is missing".to_string()))?;

        let media = self
            .upload(file)
            .await
            .ok_or_else(|| AppError::BadRequest("Avatar upload failed".to_string()))?;

        let user = self.user_store.update_avatar(user_id, &media.url).await?;
        Ok(user.into())
    }

    pub async fn update_cover_image(
        &self,
        user_id: Uuid,
        file: Option<UploadFile>,
    ) -> AppResult<UserDto> {
        let file = file
            .filter(|f| !f.is_empty())
            .ok_or_else(|| AppError::BadRequest("Cover Image file is missing".to_string()))?;

        let media = self
            .upload(file)
            .await
            .ok_or_else(|| AppError::BadRequest("Cover Image upload failed".to_string()))?;

        let user = self
            .user_store
            .update_cover_image(user_id, &media.url)
            .await?;
        Ok(user.into())
    }

    async fn find_user(&self, user_id: Uuid) -> AppResult<User> {
        self.user_store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist!".to_string()))
    }

    async fn upload(&self, file: UploadFile) -> Option<UploadedMedia> {
        let file_name = file.file_name.clone();
        match self.media_storage.upload(file).await {
            Ok(media) => Some(media),
            Err(e) => {
                tracing::warn!(file_name = %file_name, error = %e, "Media upload failed");
                None
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
