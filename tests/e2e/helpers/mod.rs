use account_service::domain::{media::MediaStorage, user::UserStore};
use account_service::infrastructure::config::{Config, Environment, LogFormat};
use account_service::infrastructure::http::create_app;
use account_service::infrastructure::repositories::InMemoryUserRepository;
use once_cell::sync::Lazy;
use serde_json::json;
use std::sync::Arc;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod fixtures;

use api_client::TestClient;
use fixtures::TestFixtures;
use media_mocks::RecordingMediaStorage;

pub const USERS: &str = "/api/v1/users";

pub const DEFAULT_PASSWORD: &str = "correct horse battery";

// Log output for failing tests, filtered by RUST_LOG
static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub struct TestContext {
    pub client: TestClient,
    pub config: Config,
    pub media: Arc<RecordingMediaStorage>,
    pub fixtures: TestFixtures,
}

/// Tokens handed out by a successful login
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".to_string(),
        port: 0, // Assigned by the OS
        access_token_secret: "test-access-secret-for-testing-only".to_string(),
        refresh_token_secret: "test-refresh-secret-for-testing-only".to_string(),
        access_token_expiry_minutes: 15,
        refresh_token_expiry_days: 10,
        cors_origin: "*".to_string(),
        cookie_secure: true,
        environment: Environment::Development,
        log_format: LogFormat::Pretty,
        cloudinary_cloud_name: "test-cloud".to_string(),
        cloudinary_upload_preset: "test-preset".to_string(),
        max_upload_bytes: 1024 * 1024,
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            Lazy::force(&TRACING);
            let config = test_config();

            let store = Arc::new(InMemoryUserRepository::new());
            let media = Arc::new(RecordingMediaStorage::new());

            let user_store: Arc<dyn UserStore> = store.clone();
            let media_storage: Arc<dyn MediaStorage> = media.clone();
            let app = create_app(&config, None, user_store, media_storage);

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            let client = TestClient::new(&base_url);
            let fixtures = TestFixtures::new(store);

            Self {
                client,
                config,
                media,
                fixtures,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // In-memory store is dropped with the context
        }
    }
}

impl TestContext {
    /// Log in through the API and return the issued tokens
    pub async fn login(&self, username: &str, password: &str) -> Session {
        let response = self
            .client
            .post(
                &format!("{USERS}/login"),
                &json!({ "username": username, "password": password }),
            )
            .await
            .unwrap();
        response.assert_status(hyper::StatusCode::OK);

        let data = response.data();
        Session {
            access_token: data["accessToken"].as_str().unwrap().to_string(),
            refresh_token: data["refreshToken"].as_str().unwrap().to_string(),
        }
    }

    /// Create a user directly in the store and log in as them
    pub async fn signed_in_user(&self, username: &str) -> Session {
        self.fixtures
            .create_user(username, DEFAULT_PASSWORD)
            .await
            .unwrap();
        self.login(username, DEFAULT_PASSWORD).await
    }
}
