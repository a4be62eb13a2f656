//! HTTP surface for the insights API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/data` | Insights matching the query-string filters |
//! | `GET`  | `/api/filters` | Distinct values for each filterable field |
//! | `GET`  | `/api/stats` | Record count and metric averages |
//! | `GET`  | `/api/health`, `/health` | Health check |
//!
//! # Response Envelope
//!
//! Success bodies are `{ "success": true, ... }` with the operation payload
//! flattened in. Store faults become HTTP 500:
//!
//! ```json
//! { "success": false, "message": "Error fetching data", "error": "database error: ..." }
//! ```
//!
//! Any other path or method returns 404
//! `{ "success": false, "message": "API endpoint not found" }`.
//!
//! # CORS
//!
//! Only `server.cors_origin` is allowed, with credentials.

use anyhow::Context;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::filter::DataParams;
use crate::query::{self, DataPayload, FiltersPayload, StatsPayload};
use crate::store::{Store, StoreError};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

/// Builds the full router: `/api` routes, root health check, 404 fallback,
/// CORS and request tracing.
///
/// Known paths hit with an unsupported method get the same 404 as unknown
/// paths. `method_not_allowed_fallback` only applies to routes registered
/// before it, so it stays after `nest` and `route`.
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin: HeaderValue = cors_origin
        .parse()
        .with_context(|| format!("invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let api = Router::new()
        .route("/data", get(handle_data))
        .route("/filters", get(handle_filters))
        .route("/stats", get(handle_stats))
        .route("/health", get(handle_health));

    Ok(Router::new()
        .nest("/api", api)
        .route("/health", get(handle_health))
        .method_not_allowed_fallback(handle_not_found)
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Starts the HTTP server on `server.host:server.port`.
///
/// Runs until SIGINT/SIGTERM, lets in-flight requests finish, then closes
/// the store.
pub async fn run_server(config: &Config, store: Arc<dyn Store>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind_addr();
    let app = build_router(
        AppState {
            store: store.clone(),
        },
        &config.server.cors_origin,
    )?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!(addr = %bind_addr, "insights API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, closing store");
    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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
}

// ============ Envelope ============

/// Success body: `success: true` plus the flattened payload.
#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

fn success<T: Serialize>(payload: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        payload,
    })
}

/// Failure body. `error` carries the underlying fault when there is one.
#[derive(Serialize)]
struct FailureBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    error: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = FailureBody {
            success: false,
            message: self.message,
            error: self.error,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Logs a store fault and maps it to a 500 with `message`.
fn store_failure(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
    move |err| {
        tracing::error!(error = %err, "{}", message);
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            error: Some(err.to_string()),
        }
    }
}

// ============ GET /api/data ============

async fn handle_data(
    State(state): State<AppState>,
    params: Result<Query<DataParams>, QueryRejection>,
) -> Result<Json<Envelope<DataPayload>>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError {
        status: StatusCode::BAD_REQUEST,
        message: "Invalid query parameters".to_string(),
        error: Some(rejection.body_text()),
    })?;

    let payload = query::list_insights(state.store.as_ref(), &params)
        .await
        .map_err(store_failure("Error fetching data"))?;
    Ok(success(payload))
}

// ============ GET /api/filters ============

async fn handle_filters(
    State(state): State<AppState>,
) -> Result<Json<Envelope<FiltersPayload>>, ApiError> {
    let filters = query::filter_options(state.store.as_ref())
        .await
        .map_err(store_failure("Error fetching filter options"))?;
    Ok(success(FiltersPayload { filters }))
}

// ============ GET /api/stats ============

async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<Envelope<StatsPayload>>, ApiError> {
    let stats = query::dashboard_stats(state.store.as_ref())
        .await
        .map_err(store_failure("Error fetching statistics"))?;
    Ok(success(StatsPayload { stats }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthPayload {
    message: String,
    timestamp: String,
}

async fn handle_health() -> Json<Envelope<HealthPayload>> {
    success(HealthPayload {
        message: "Insights Dashboard API is running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

// ============ Fallback ============

async fn handle_not_found() -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        message: "API endpoint not found".to_string(),
        error: None,
    }
}
