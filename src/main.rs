use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account_service::domain::{media::MediaStorage, user::UserStore};
use account_service::infrastructure::config::{Config, LogFormat};
use account_service::infrastructure::db::{check_connection, create_pool, run_migrations};
use account_service::infrastructure::http::{create_app, start_http_server};
use account_service::infrastructure::media::CloudinaryStorage;
use account_service::infrastructure::repositories::{InMemoryUserRepository, UserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting account service on {}:{}",
        config.host,
        config.port
    );

    let (pool, user_store) = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            tracing::info!("Database connection pool created");

            check_connection(&pool).await?;
            run_migrations(&pool).await?;
            tracing::info!("Database connection verified and migrations applied");

            let pool = Arc::new(pool);
            let store: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
            (Some(pool), store)
        }
        None => {
            if !config.is_development() {
                anyhow::bail!("DATABASE_URL is required outside development");
            }
            tracing::warn!("DATABASE_URL not set, using in-memory user store; data is lost on restart");
            let store: Arc<dyn UserStore> = Arc::new(InMemoryUserRepository::new());
            (None, store)
        }
    };

    let media_storage: Arc<dyn MediaStorage> = Arc::new(CloudinaryStorage::new(
        &config.cloudinary_cloud_name,
        config.cloudinary_upload_preset.clone(),
    ));
    tracing::info!(cloud = %config.cloudinary_cloud_name, "Media storage configured");

    let app = create_app(&config, pool, user_store, media_storage);

    start_http_server(&config, app).await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
