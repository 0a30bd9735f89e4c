use crate::error::{AppError, AppResult};

/// Cost factor for bcrypt hashing
const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt on the blocking pool
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored bcrypt hash. A malformed hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

    Ok(verified.unwrap_or(false))
}
