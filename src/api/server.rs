//! csvgrid session server implementation
//!
//! HTTP REST API server using Axum. Each uploaded CSV becomes a session that
//! can be edited cell by cell and downloaded again.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use super::session::{SessionRegistry, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL};

/// API Server configuration
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted CSV upload, in bytes
    pub max_upload_bytes: usize,
    /// Live sessions kept before the least recently used one is evicted
    pub max_sessions: usize,
    /// Idle time after which a session is discarded
    pub session_ttl: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: 10 * 1024 * 1024,
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub version: String,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            sessions: SessionRegistry::new(),
        }
    }

    /// State whose session registry uses the configured limits
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            sessions: SessionRegistry::with_limits(config.max_sessions, config.session_ttl),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the router with all routes and middleware
pub fn build_router(config: &ApiConfig, state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Session endpoints
        .route("/api/v1/sessions", post(handlers::create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/v1/sessions/:id/csv", put(handlers::reload_session))
        .route("/api/v1/sessions/:id/cells", put(handlers::set_cell))
        .route("/api/v1/sessions/:id/rows", post(handlers::add_row))
        .route("/api/v1/sessions/:id/rows/:row", delete(handlers::remove_row))
        .route("/api/v1/sessions/:id/edits", post(handlers::apply_edits))
        .route("/api/v1/sessions/:id/export", get(handlers::export))
        // State and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Run the API server until Ctrl+C or SIGTERM
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(&config));
    let app = build_router(&config, state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("csvgrid session server starting on http://{}", addr);
    info!("   Sessions: /api/v1/sessions (upload CSV with POST)");
    info!(
        "   Limits: {} sessions, {}s idle TTL, {} byte uploads",
        config.max_sessions,
        config.session_ttl.as_secs(),
        config.max_upload_bytes
    );
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("csvgrid session server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
