pub mod dto;
pub mod model;
pub mod password;
pub mod service;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;

pub use dto::{RegisterInput, UpdateAccountRequest};
pub use model::{NewUser, User, UserDto};
pub use service::UserService;

/// Persistence for user accounts, including the current refresh token of each account.
///
/// Implementations must give read-after-write consistency: a refresh rotation reads the
/// stored token and then writes the next one.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>>;

    /// Match on lowercase username OR lowercase email
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<User>>;

    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    /// Unconditionally overwrite the stored refresh token
    async fn set_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()>;

    /// Replace the stored refresh token only if it still equals `expected`.
    ///
    /// Returns `false` when the stored token differs (or the user is gone); nothing is
    /// written in that case.
    async fn swap_refresh_token(&self, user_id: Uuid, expected: &str, new: &str)
        -> AppResult<bool>;

    /// Unset the stored refresh token
    async fn clear_refresh_token(&self, user_id: Uuid) -> AppResult<()>;

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()>;

    async fn update_account_details(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> AppResult<User>;

    async fn update_avatar(&self, user_id: Uuid, url: &str) -> AppResult<User>;

    async fn update_cover_image(&self, user_id: Uuid, url: &str) -> AppResult<User>;
}
