use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{self, AppState};
use crate::models::ErrorDescriptor;

/// Upper bound for one request, above the slowest upstream timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .nest("/api", api::router())
        .fallback(api::not_found);

    with_request_timeout(router, REQUEST_TIMEOUT)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Cut requests off after `timeout` with a JSON 408
fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(middleware::map_response(timeout_body))
}

async fn timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorDescriptor::new("Request timed out")),
        )
            .into_response();
    }
    response
}

pub async fn run(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Web server running at http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "Web server failed")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
