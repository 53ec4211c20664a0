//! REST API server for SpentLedger
//!
//! Exposes the spent address export, merge and verify operations over HTTP.
//! File and database work is blocking, so every handler that touches them
//! runs on the blocking thread pool.

use axum::{
    extract::{Request, State},
    http::{self, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::SpentError;
use crate::export::ExportSummary;
use crate::merge::MergeReport;
use crate::service::SpentAddressService;
use crate::verify::Verification;

/// Shared state behind every handler
#[derive(Clone)]
pub struct ApiNode {
    pub service: SpentAddressService,
    cors_origins: Vec<String>,
    api_stats: Arc<RwLock<ApiStats>>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    exports: u64,
    merges: u64,
    addresses_imported: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl ApiNode {
    pub fn new(service: SpentAddressService) -> Self {
        Self {
            service,
            cors_origins: Vec::new(),
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }

    /// Browser origins allowed to make cross-origin calls
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            exports: stats.exports,
            merges: stats.merges,
            addresses_imported: stats.addresses_imported,
            uptime_seconds: uptime,
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Spent(SpentError),
    InvalidInput(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Spent(e) => {
                let status = match e {
                    SpentError::DestinationIsDirectory(_) => StatusCode::CONFLICT,
                    SpentError::MissingChecksum(_)
                    | SpentError::ChecksumMismatch { .. }
                    | SpentError::CountMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    SpentError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<SpentError> for ApiError {
    fn from(err: SpentError) -> Self {
        ApiError::Spent(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("Background task failed: {}", err))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct MergeRequest {
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub exports: u64,
    pub merges: u64,
    pub addresses_imported: u64,
    pub uptime_seconds: u64,
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(State(node): State<Arc<ApiNode>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = node.api_stats.write().await;
    stats.record_request(success);

    response
}

async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(node: Arc<ApiNode>) -> Router {
    let origins: Vec<HeaderValue> = node
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) if value != "*" => Some(value),
            _ => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/spent/export", post(export_spent_addresses))
        .route("/spent/merge", post(merge_spent_addresses))
        .route("/spent/verify", post(verify_spent_addresses))
        .route("/spent/count", get(get_address_count))
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(node.clone(), stats_middleware))
        .with_state(node);

    Router::new().nest("/api", api_routes).layer(cors)
}

/// Serve the API on `host:port` until the process is stopped
pub async fn run_api_server(
    node: Arc<ApiNode>,
    host: IpAddr,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let addr = SocketAddr::new(host, port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn export_spent_addresses(
    State(node): State<Arc<ApiNode>>,
) -> Result<Json<ExportSummary>, ApiError> {
    let service = node.service.clone();
    let summary = tokio::task::spawn_blocking(move || service.export_spent_addresses()).await??;

    node.api_stats.write().await.exports += 1;
    Ok(Json(summary))
}

async fn merge_spent_addresses(
    State(node): State<Arc<ApiNode>>,
    body: Option<Json<MergeRequest>>,
) -> Result<Json<MergeReport>, ApiError> {
    let files = body.and_then(|Json(req)| req.files);
    let service = node.service.clone();
    let report = tokio::task::spawn_blocking(move || service.merge_spent_addresses(files)).await?;

    {
        let mut stats = node.api_stats.write().await;
        stats.merges += 1;
        stats.addresses_imported += report.imported_count;
    }
    Ok(Json(report))
}

async fn verify_spent_addresses(
    State(node): State<Arc<ApiNode>>,
    body: Option<Json<VerifyRequest>>,
) -> Result<Json<Verification>, ApiError> {
    let file = body.and_then(|Json(req)| req.file);
    if matches!(file.as_deref(), Some(f) if f.trim().is_empty()) {
        return Err(ApiError::InvalidInput("file cannot be empty".to_string()));
    }

    let service = node.service.clone();
    let verification = tokio::task::spawn_blocking(move || {
        let path = file.map(PathBuf::from);
        service.verify_spent_addresses(path.as_deref())
    })
    .await??;

    Ok(Json(verification))
}

async fn get_address_count(
    State(node): State<Arc<ApiNode>>,
) -> Result<Json<CountResponse>, ApiError> {
    let service = node.service.clone();
    let count = tokio::task::spawn_blocking(move || service.address_count()).await??;
    Ok(Json(CountResponse { count }))
}

async fn get_api_stats(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    Json(node.get_stats().await)
}
