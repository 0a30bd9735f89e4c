use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    domain::user::{NewUser, User, UserStore},
    error::{AppError, AppResult},
};

/// Process-local user store for development runs without Postgres, and for tests.
///
/// Every write happens under a single write lock, so `swap_refresh_token` is atomic.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, user_id: Uuid, apply: F) -> AppResult<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User does not exist!".to_string()))?;
        apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| Some(u.username.as_str()) == username || Some(u.email.as_str()) == email)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(AppError::Conflict(
                "User with username or email already exists!".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            full_name: new_user.full_name,
            avatar: new_user.avatar,
            cover_image: new_user.cover_image,
            password_hash: new_user.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        // Matches an UPDATE that touches no rows.
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.refresh_token = Some(token.to_string());
        }
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        user_id: Uuid,
        expected: &str,
        new: &str,
    ) -> AppResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&user_id) {
            Some(user) if user.refresh_token.as_deref() == Some(expected) => {
                user.refresh_token = Some(new.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> AppResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.refresh_token = None;
        }
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        self.update(user_id, |u| u.password_hash = password_hash.to_string())
            .await
            .map(|_| ())
    }

    async fn update_account_details(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> AppResult<User> {
        // Check and write under one lock
        let mut users = self.users.write().await;
        if users.values().any(|u| u.id != user_id && u.email == email) {
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }

        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User does not exist!".to_string()))?;
        user.full_name = full_name.to_string();
        user.email = email.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_avatar(&self, user_id: Uuid, url: &str) -> AppResult<User> {
        self.update(user_id, |u| u.avatar = url.to_string()).await
    }

    async fn update_cover_image(&self, user_id: Uuid, url: &str) -> AppResult<User> {
        self.update(user_id, |u| u.cover_image = url.to_string()).await
    }
}
