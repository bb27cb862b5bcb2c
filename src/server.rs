//! HTTP API for the query pipeline.
//!
//! Exposes the query engine over JSON HTTP. A query can be processed
//! synchronously (the request blocks for the full pipeline, typically
//! seconds to tens of seconds) or asynchronously via the job endpoints.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Service status |
//! | `GET`  | `/health` | Detailed health check |
//! | `POST` | `/query` | Process a query synchronously |
//! | `POST` | `/query/async` | Start a background query, returns a job id |
//! | `GET`  | `/jobs/{id}` | Status/result of a background query |
//!
//! # Error Contract
//!
//! All error responses use a machine-readable code plus a message:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Codes: `bad_request` (400), `not_found` (404), `index_unavailable` (503),
//! `engine_uninitialized` (503), `configuration` (500), `generation_failed`
//! (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::{self, QueryEngine};
use crate::error::CagError;
use crate::jobs::{JobTable, QueryResponse};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    /// `None` when startup ingestion failed; endpoints then answer 503
    /// rather than preventing the server from starting.
    engine: Option<Arc<QueryEngine>>,
    jobs: Arc<JobTable>,
}

/// Start the HTTP server on the configured bind address.
///
/// The engine is bootstrapped first (opening the store and running the
/// one-time ingestion when empty). A bootstrap failure is logged and the
/// server still starts, reporting unhealthy until restarted.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let engine = match engine::bootstrap(config).await {
        Ok(engine) => {
            info!(mode = ?engine.mode(), "query engine initialized");
            Some(Arc::new(engine))
        }
        Err(e) => {
            error!(error = %e, "failed to initialize query engine");
            None
        }
    };

    let state = AppState {
        engine,
        jobs: Arc::new(JobTable::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/query", post(handle_query))
        .route("/query/async", post(handle_query_async))
        .route("/jobs/{id}", get(handle_job_status))
        .layer(cors)
        .with_state(state);

    let bind_addr = &config.server.bind;
    info!(addr = %bind_addr, "HTTP server listening");
    println!("CAG server listening on http://{bind_addr}");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn engine_uninitialized() -> AppError {
    AppError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "engine_uninitialized",
        "query engine failed to initialize; check server logs",
    )
}

/// Map pipeline errors onto HTTP statuses without losing the error kind.
fn classify_error(err: CagError) -> AppError {
    match &err {
        CagError::InvalidQuery(_) => {
            AppError::new(StatusCode::BAD_REQUEST, "bad_request", err.to_string())
        }
        CagError::IndexUnavailable(_) => AppError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "index_unavailable",
            err.to_string(),
        ),
        CagError::Generation(_) => AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "generation_failed",
            err.to_string(),
        ),
        CagError::Configuration(_) | CagError::ChunkingConfiguration { .. } => AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "configuration",
            err.to_string(),
        ),
    }
}

// ============ GET / ============

#[derive(Serialize)]
struct RootResponse {
    status: String,
    service: String,
    version: String,
    engine_initialized: bool,
}

async fn handle_root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "online".to_string(),
        service: "cag".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine_initialized: state.engine.is_some(),
    })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthChecks {
    engine: bool,
    model_credential: bool,
    index_store: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<Utc>,
    checks: HealthChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_entries: Option<u64>,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut index_entries = None;
    let mut index_store = false;

    if let Some(engine) = &state.engine {
        if let Ok(count) = engine.entry_count().await {
            index_store = true;
            index_entries = Some(count);
        }
    }

    let healthy = state.engine.is_some() && index_store;

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now(),
        checks: HealthChecks {
            engine: state.engine.is_some(),
            model_credential: std::env::var("OPENAI_API_KEY").is_ok(),
            index_store,
        },
        index_entries,
    })
}

// ============ POST /query ============

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
    /// Opaque session tag echoed back; conversation state is not modeled.
    session_id: Option<String>,
}

async fn run_query(engine: &QueryEngine, request: &QueryRequest) -> Result<QueryResponse, CagError> {
    let started = Instant::now();
    let outcome = engine.process_query(&request.query).await?;

    Ok(QueryResponse {
        query: outcome.query,
        response: outcome.answer,
        session_id: request
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        timestamp: Utc::now(),
        processing_time: started.elapsed().as_secs_f64(),
    })
}

async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let engine = state.engine.as_ref().ok_or_else(engine_uninitialized)?;

    let response = run_query(engine, &request).await.map_err(classify_error)?;
    Ok(Json(response))
}

// ============ POST /query/async ============

#[derive(Serialize)]
struct AsyncQueryAccepted {
    job_id: String,
    status: String,
}

async fn handle_query_async(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<AsyncQueryAccepted>, AppError> {
    let engine = state
        .engine
        .as_ref()
        .cloned()
        .ok_or_else(engine_uninitialized)?;

    let job_id = state.jobs.create();
    let jobs = state.jobs.clone();
    let job = job_id.clone();

    tokio::spawn(async move {
        match run_query(&engine, &request).await {
            Ok(response) => jobs.complete(&job, response),
            Err(e) => {
                error!(job_id = %job, error = %e, "async query failed");
                jobs.fail(&job, e.to_string());
            }
        }
    });

    Ok(Json(AsyncQueryAccepted {
        job_id,
        status: "processing".to_string(),
    }))
}

// ============ GET /jobs/{id} ============

async fn handle_job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<crate::jobs::JobStatus>, AppError> {
    state
        .jobs
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, "not_found", "job not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let e = classify_error(CagError::InvalidQuery("empty".to_string()));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "bad_request");

        let e = classify_error(CagError::IndexUnavailable("down".to_string()));
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(e.code, "index_unavailable");

        let e = classify_error(CagError::Generation("rate limit".to_string()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code, "generation_failed");

        let e = classify_error(CagError::Configuration("no key".to_string()));
        assert_eq!(e.code, "configuration");
    }
}
