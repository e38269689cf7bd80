//! Defines routes for the document API.
//!
//! ## Structure
//! - **Health endpoints** (mounted at root)
//!   - `GET  /healthz` — liveness
//!   - `GET  /readyz` — readiness of the object store
//!
//! - **Document endpoints** (mounted under `/api/v1`)
//!   - `POST /upload/base64` — upload a data-URI payload
//!   - `POST /upload/file` — multipart file upload
//!   - `GET  /download/{doc_key}/{doc_name}` — download (`?type=base64|download`)

use crate::{
    config::AppConfig,
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{get_file, upload_base64, upload_file},
    },
    middleware::{
        REQUEST_ID_HEADER, create_rate_limiter, rate_limit_middleware, request_id_middleware,
    },
    services::upload_service::UploadService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the router carrying `UploadService` as shared state.
///
/// The rate limit covers `/api/v1` only; health endpoints are never limited.
pub fn routes(cfg: &AppConfig) -> Router<UploadService> {
    let mut api = Router::new()
        .route("/upload/base64", post(upload_base64))
        .route("/upload/file", post(upload_file))
        .route("/download/{doc_key}/{doc_name}", get(get_file));

    if let Some(limiter) = create_rate_limiter(cfg.rate_limit_rps) {
        api = api.layer(axum_middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));
    }

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(cfg.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(cors())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
            header::PRAGMA,
            REQUEST_ID_HEADER,
        ])
        .expose_headers([REQUEST_ID_HEADER])
}
