// HTTP API Server module

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::proxy::{ApiKeys, Upstream};

mod handlers;
pub mod response;

pub use handlers::{KeyQuery, KeyStatus};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<ApiKeys>,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(config: AppConfig, keys: ApiKeys, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            config: Arc::new(config),
            keys: Arc::new(keys),
            upstream,
        }
    }
}

/// Pre-flight answers for the POST endpoints. Any `OPTIONS` request gets an
/// empty 200 without reaching the handler.
fn post_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the application router. Method checks happen inside the handlers so
/// that rejections carry the JSON error body and CORS headers.
pub fn router(state: AppState) -> Router {
    let prefix = state.config.normalized_prefix();
    let body_limit = state.config.body_limit_bytes();

    Router::new()
        .route("/", get(handlers::root))
        .route(
            &format!("{}/gemini-proxy", prefix),
            any(handlers::gemini_proxy).layer(post_cors()),
        )
        .route(
            &format!("{}/proxy-api-request", prefix),
            any(handlers::proxy_api_request).layer(post_cors()),
        )
        .route(&format!("{}/get-api-key", prefix), any(handlers::get_api_key))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
