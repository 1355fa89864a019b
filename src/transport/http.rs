//! HTTP transport
//!
//! Serves the allowlist service as a small JSON API:
//!
//! - `GET  /health`
//! - `POST /v4/allowlist/resolve`
//! - `GET  /v4/allowlist/organizations`
//! - `GET  /v4/allowlist/organizations/{name}`
//!
//! Every response carries an `X-REQUEST-ID` header, copied from the request
//! or generated.

use crate::error::{AppError, StoreError};
use crate::server::{AllowlistRequest, AllowlistService};
use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, Request, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Default port for the HTTP transport
pub const DEFAULT_HTTP_PORT: u16 = 20290;

/// Header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to (e.g., "127.0.0.1:20290")
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)),
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with the specified bind address
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind }
    }

    /// Create config from host and port strings
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, std::net::AddrParseError> {
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self::new(addr))
    }
}

/// Request id assigned by [`assign_request_id`], available to handlers as an extension
#[derive(Debug, Clone)]
struct RequestId(String);

#[derive(Serialize)]
struct HealthInfo {
    status: &'static str,
    name: String,
    version: String,
    grammar: String,
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
    request_id: String,
}

/// Error response with the request id attached
struct ApiError {
    status: StatusCode,
    message: String,
    request_id: String,
}

impl ApiError {
    fn from_app(err: AppError, request_id: String) -> Self {
        let status = match &err {
            AppError::Store(StoreError::OrganizationNotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
            request_id,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.status.as_u16(),
            message: self.message,
            request_id: self.request_id,
        };
        (self.status, Json(body)).into_response()
    }
}

fn request_id_from(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(AllowlistService::new_request_id)
}

/// Take the request id from `X-REQUEST-ID` (or generate one), hand it to the
/// handler and echo it on the response
async fn assign_request_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = request_id_from(req.headers());
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Build the API router
pub fn router(service: AllowlistService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v4/allowlist/resolve", post(resolve))
        .route("/v4/allowlist/organizations", get(list_organizations))
        .route("/v4/allowlist/organizations/{name}", get(get_organization))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(assign_request_id)),
        )
        .with_state(service)
}

async fn health(State(service): State<AllowlistService>) -> Json<HealthInfo> {
    Json(HealthInfo {
        status: "ok",
        name: service.name().to_string(),
        version: service.version().to_string(),
        grammar: service.resolver().grammar().to_string(),
    })
}

async fn resolve(
    State(service): State<AllowlistService>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Result<Json<AllowlistRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(request_id = %request_id, error = %rejection, "rejecting malformed request body");
            let err = AppError::InvalidRequest(rejection.body_text());
            return ApiError::from_app(err, request_id).into_response();
        }
    };

    match service.check(&request_id, request) {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "allowlist check failed");
            ApiError::from_app(e, request_id).into_response()
        }
    }
}

async fn list_organizations(State(service): State<AllowlistService>) -> Json<Vec<String>> {
    Json(service.organizations())
}

async fn get_organization(
    State(service): State<AllowlistService>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(name): Path<String>,
) -> Response {
    match service.organization(&name) {
        Ok(org) => Json(org).into_response(),
        Err(e) => ApiError::from_app(e, request_id).into_response(),
    }
}

/// Run the HTTP server until Ctrl+C
///
/// A background task evicts stale request-metrics entries once per TTL.
pub async fn run_http(service: AllowlistService, config: HttpConfig) -> anyhow::Result<()> {
    let metrics = service.metrics().clone();
    let evictor = tokio::spawn(async move {
        let mut interval = tokio::time::interval(metrics.ttl().max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let evicted = metrics.evict_expired();
            if evicted > 0 {
                debug!(evicted, "evicted stale request metrics");
            }
        }
    });

    let listener = TcpListener::bind(config.bind).await?;
    info!("Allowlist HTTP server listening on http://{}", config.bind);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await?;

    evictor.abort();
    info!("HTTP server stopped");
    Ok(())
}
