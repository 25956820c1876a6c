//! HTTP surface.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/?country_code=FR&city=Paris&date=14.11.2023T22:13` | Weather for a place and hour |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Validation failures answer 400 with a list of `{field, message}`. Lookup
//! failures answer with the status and body chosen by [`WeatherService::respond`].

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use weather_core::{ResolveError, WeatherService};

use crate::query::WeatherQuery;

#[derive(Clone)]
struct AppState {
    service: Arc<WeatherService>,
}

pub fn router(service: Arc<WeatherService>) -> Router {
    Router::new()
        .route("/", get(handle_weather))
        .route("/health", get(handle_health))
        .with_state(AppState { service })
}

/// Serve until ctrl-c.
pub async fn run(service: Arc<WeatherService>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "weather server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("weather server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

async fn handle_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Response {
    let request = match query.validate() {
        Ok(request) => request,
        Err(fields) => {
            debug!(?fields, "rejected weather query");
            let err = ResolveError::Validation(fields);
            return (StatusCode::BAD_REQUEST, Json(err.body())).into_response();
        }
    };

    let reply = state.service.respond(&request).await;
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(reply.body)).into_response()
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
