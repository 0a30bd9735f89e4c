use account_service::domain::user::{password::hash_password, NewUser, User, UserStore};
use anyhow::Result;
use std::sync::Arc;

use account_service::infrastructure::repositories::InMemoryUserRepository;

pub struct TestFixtures {
    store: Arc<InMemoryUserRepository>,
}

impl TestFixtures {
    pub fn new(store: Arc<InMemoryUserRepository>) -> Self {
        Self { store }
    }

    /// Insert a user with a hashed password, bypassing registration uploads
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User> {
        let password_hash = hash_password(password).await?;
        let user = self
            .store
            .create(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                full_name: format!("Test {}", username),
                avatar: format!("https://media.test/{}/avatar.png", username),
                cover_image: String::new(),
                password_hash,
            })
            .await?;
        Ok(user)
    }

    pub async fn stored_refresh_token(&self, username: &str) -> Option<String> {
        self.store
            .find_by_username_or_email(Some(username), None)
            .await
            .ok()
            .flatten()
            .and_then(|u| u.refresh_token)
    }
}
