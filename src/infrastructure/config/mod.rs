use chrono::Duration;
use serde::Deserialize;
use std::env;

use crate::domain::auth::TokenConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres URL. When unset the in-memory user store is used.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
    pub cors_origin: String,
    pub cookie_secure: bool,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Media host
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must be different")]
    SharedSecret,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let or_default = |name: &str, default: &str| {
            lookup(name).unwrap_or_else(|| default.to_string())
        };

        let config = Config {
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            host: or_default("HOST", "0.0.0.0"),
            port: parse("PORT", or_default("PORT", "8000"))?,
            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: required("REFRESH_TOKEN_SECRET")?,
            access_token_expiry_minutes: parse(
                "ACCESS_TOKEN_EXPIRY_MINUTES",
                or_default("ACCESS_TOKEN_EXPIRY_MINUTES", "15"),
            )?,
            refresh_token_expiry_days: parse(
                "REFRESH_TOKEN_EXPIRY_DAYS",
                or_default("REFRESH_TOKEN_EXPIRY_DAYS", "10"),
            )?,
            cors_origin: or_default("CORS_ORIGIN", "*"),
            cookie_secure: or_default("COOKIE_SECURE", "true").to_lowercase() != "false",
            environment: match or_default("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match or_default("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            cloudinary_cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            cloudinary_upload_preset: required("CLOUDINARY_UPLOAD_PRESET")?,
            max_upload_bytes: parse(
                "MAX_UPLOAD_BYTES",
                or_default("MAX_UPLOAD_BYTES", "10485760"),
            )?,
        };

        if config.access_token_secret == config.refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Signing secrets and lifetimes for the token service
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            access_secret: self.access_token_secret.clone(),
            refresh_secret: self.refresh_token_secret.clone(),
            access_ttl: Duration::minutes(self.access_token_expiry_minutes),
            refresh_ttl: Duration::days(self.refresh_token_expiry_days),
        }
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
