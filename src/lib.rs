pub mod admin;
pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;

use admin::{AdminState, HitCounter, count_hits};
use api::create_api_router;
use auth::Authenticator;
use axum::{Router, middleware};
use cli::Platform;
use db::Database;
use jwt::JwtConfig;
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing access tokens
    pub jwt_secret: Vec<u8>,
    /// Key the payment provider presents as `Authorization: ApiKey`
    pub polka_key: String,
    /// Deployment platform, gates `/admin/reset`
    pub platform: Platform,
    /// Directory served under `/app/`
    pub filepath_root: PathBuf,
    /// Login attempts allowed per minute per client IP
    pub login_attempts_per_minute: u32,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let auth = Authenticator::new(Arc::new(JwtConfig::new(&config.jwt_secret)));
    let hits = HitCounter::default();

    let api_router = create_api_router(
        config.db.clone(),
        auth,
        Arc::from(config.polka_key.as_str()),
        Arc::new(RateLimitConfig::new(config.login_attempts_per_minute)),
    );

    let admin_router = admin::router(AdminState {
        db: config.db.clone(),
        hits: hits.clone(),
        platform: config.platform,
    });

    // Static files (public, every request counted)
    let app_routes = Router::new()
        .nest_service("/app", ServeDir::new(&config.filepath_root))
        .route_layer(middleware::from_fn_with_state(hits, count_hits));

    Router::new()
        .nest("/api", api_router)
        .nest("/admin", admin_router)
        .merge(app_routes)
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
