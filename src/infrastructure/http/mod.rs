use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    controllers::{auth::AuthController, health, user::UserController},
    domain::{auth::AuthService, media::MediaStorage, user::UserService, user::UserStore},
    infrastructure::{
        auth::{auth_middleware, request_id_middleware, CookieSettings},
        config::Config,
        db::DbPool,
    },
};

pub const USERS_BASE_PATH: &str = "/api/v1/users";

/// Wire services and controllers and build the application router.
///
/// `pool` is only used by the readiness probe; persistence goes through `user_store`.
pub fn create_app(
    config: &Config,
    pool: Option<Arc<DbPool>>,
    user_store: Arc<dyn UserStore>,
    media_storage: Arc<dyn MediaStorage>,
) -> Router {
    let auth_service = Arc::new(AuthService::new(user_store.clone(), config.token_config()));
    let user_service = Arc::new(UserService::new(
        user_store.clone(),
        media_storage,
        auth_service.clone(),
    ));

    let cookies = CookieSettings {
        secure: config.cookie_secure,
    };
    let auth_controller = Arc::new(AuthController::new(
        user_service.clone(),
        auth_service.clone(),
        cookies,
    ));
    let user_controller = Arc::new(UserController::new(user_service));

    let auth_layer = middleware::from_fn_with_state(
        (user_store.clone(), auth_service.clone()),
        auth_middleware,
    );

    // Public routes
    let public_auth_routes = Router::new()
        .route("/login", post(AuthController::login))
        .route("/refresh-token", post(AuthController::refresh_token))
        .with_state(auth_controller.clone());

    let public_user_routes = Router::new()
        .route("/register", post(UserController::register))
        .with_state(user_controller.clone());

    // Routes that need a valid access token
    let protected_auth_routes = Router::new()
        .route("/logout", post(AuthController::logout))
        .route("/change-password", post(AuthController::change_password))
        .with_state(auth_controller)
        .route_layer(auth_layer.clone());

    let protected_user_routes = Router::new()
        .route("/current-user", get(UserController::current_user))
        .route("/update-account", patch(UserController::update_account))
        .route("/avatar", patch(UserController::update_avatar))
        .route("/cover-image", patch(UserController::update_cover_image))
        .with_state(user_controller)
        .route_layer(auth_layer);

    let users = Router::new()
        .merge(public_auth_routes)
        .merge(public_user_routes)
        .merge(protected_auth_routes)
        .merge(protected_user_routes);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool)
        .nest(USERS_BASE_PATH, users)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors_origin)),
        )
}

/// Credentials (cookies) are only allowed for an explicit origin
fn cors_layer(origin: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origin == "*" {
        return base.allow_origin(tower_http::cors::Any);
    }

    match HeaderValue::from_str(origin) {
        Ok(value) => base.allow_origin(value).allow_credentials(true),
        Err(_) => {
            tracing::warn!(origin = %origin, "Invalid CORS_ORIGIN, allowing any origin without credentials");
            base.allow_origin(tower_http::cors::Any)
        }
    }
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(config: &Config, app: Router) -> Result<(), std::io::Error> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
