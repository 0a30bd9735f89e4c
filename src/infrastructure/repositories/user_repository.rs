use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::infrastructure::db::DbPool;
use crate::{
    domain::user::{NewUser, User, UserStore},
    error::{AppError, AppResult},
};

pub struct UserRepository {
    pool: Arc<DbPool>,
}

impl UserRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

/// Turn unique-constraint violations into a 409 instead of a 500
fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// Find user by ID
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let pool = self.pool.as_ref();
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Find user by username or email
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>> {
        let pool = self.pool.as_ref();
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NOT NULL AND username = $1)
               OR ($2::text IS NOT NULL AND email = $2)
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Create a new user
    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let pool = self.pool.as_ref();
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(&new_user.avatar)
        .bind(&new_user.cover_image)
        .bind(&new_user.password_hash)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| conflict_on_unique(e, "User with username or email already exists!"))?;

        Ok(user)
    }

    /// Overwrite the current refresh token; only this column is written
    async fn set_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Compare-and-swap of the current refresh token
    async fn swap_refresh_token(
        &self,
        user_id: Uuid,
        expected: &str,
        new: &str,
    ) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $1
            WHERE id = $2 AND refresh_token = $3
            "#,
        )
        .bind(new)
        .bind(user_id)
        .bind(expected)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Unset the current refresh token
    async fn clear_refresh_token(&self, user_id: Uuid) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query("UPDATE users SET refresh_token = NULL WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User does not exist!".to_string()));
        }
        Ok(())
    }

    async fn update_account_details(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> AppResult<User> {
        let pool = self.pool.as_ref();
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = $1, email = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(full_name)
        .bind(email)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email is already in use"))?
        .ok_or_else(|| AppError::NotFound("User does not exist!".to_string()))
    }

    async fn update_avatar(&self, user_id: Uuid, url: &str) -> AppResult<User> {
        let pool = self.pool.as_ref();
        sqlx::query_as::<_, User>(
            "UPDATE users SET avatar = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(url)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist!".to_string()))
    }

    async fn update_cover_image(&self, user_id: Uuid, url: &str) -> AppResult<User> {
        let pool = self.pool.as_ref();
        sqlx::query_as::<_, User>(
            "UPDATE users SET cover_image = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(url)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist!".to_string()))
    }
}
