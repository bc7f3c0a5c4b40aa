//! REST API and WebSocket server for the monitoring engine
//!
//! This module exposes the engine's operations over HTTP, plus a WebSocket
//! feed that pushes a full snapshot after every tick and every mutation.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **MonitorEngine** handle as the only shared state
//! - **WebSocket** connections subscribed as notifier listeners
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/websites` - List monitored targets
//! - `POST /api/websites` - Register a target
//! - `DELETE /api/websites` - Remove a target
//! - `WS /ws` - Live snapshot stream
//! - `/` - Dashboard `index.html` (if the directory exists)
//! - `/static/*` - Dashboard assets

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;
#[cfg(feature = "api")]
pub mod websocket;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;
#[cfg(feature = "api")]
pub use types::{HealthResponse, MessageResponse, WebsiteInput};

#[cfg(feature = "api")]
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::path::PathBuf;
#[cfg(feature = "api")]
use tracing::info;

use crate::config::ApiSection;

/// Directory served at `/` unless configured otherwise
pub const DEFAULT_STATIC_DIR: &str = "frontend";

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8000")
    pub bind_addr: SocketAddr,

    /// Enable CORS for dashboards served elsewhere
    pub enable_cors: bool,

    /// Directory with the static dashboard
    pub static_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: crate::util::get_bind_addr(),
            enable_cors: true,
            static_dir: Some(PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }
}

impl ApiConfig {
    /// Overlay the config file's `api` section on the defaults
    pub fn from_section(section: Option<&ApiSection>) -> Self {
        let mut config = Self::default();

        if let Some(section) = section {
            if let Some(bind) = section.bind {
                config.bind_addr = bind;
            }
            if let Some(cors) = section.cors {
                config.enable_cors = cors;
            }
            if let Some(dir) = &section.static_dir {
                config.static_dir = Some(dir.clone());
            }
        }

        config
    }
}

/// Build the application router
#[cfg(feature = "api")]
pub fn router(state: ApiState, config: &ApiConfig) -> Router {
    use tower::ServiceBuilder;
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::services::{ServeDir, ServeFile};
    use tower_http::trace::TraceLayer;

    let mut app = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route(
            "/api/websites",
            get(routes::websites::list_websites)
                .post(routes::websites::add_website)
                .delete(routes::websites::remove_website),
        )
        .route("/ws", get(websocket::websocket_handler))
        .with_state(state);

    if let Some(dir) = &config.static_dir {
        if dir.exists() {
            info!("serving dashboard from {}", dir.display());
            app = app
                .route_service("/", ServeFile::new(dir.join("index.html")))
                .nest_service("/static", ServeDir::new(dir));
        } else {
            info!("dashboard directory not found at {}", dir.display());
        }
    }

    let cors = if config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, &config);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    // Spawn server in background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
