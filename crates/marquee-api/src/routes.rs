//! Router setup with API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use marquee_core::config::MarqueeConfig;
use marquee_core::error::MarqueeError;

use crate::handlers;
use crate::state::AppState;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 256 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Allow the configured port plus port+1 for a dev frontend.
    let port = state.config.general.port;
    let dev_port = port.saturating_add(1);
    let origins: Vec<HeaderValue> = [port, dev_port]
        .iter()
        .flat_map(|p| {
            [
                format!("http://127.0.0.1:{}", p),
                format!("http://localhost:{}", p),
            ]
        })
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on localhost at the configured port.
pub async fn start_server(config: &MarqueeConfig, state: AppState) -> Result<(), MarqueeError> {
    let addr = format!("127.0.0.1:{}", config.general.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MarqueeError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| MarqueeError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
