//! Request-scoped middleware: request IDs and the optional global rate limit.

use crate::{errors::AppError, models::api_response::CODE_RATE_LIMITED};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::{num::NonZeroU32, sync::Arc};
use tracing::{Instrument, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub type SharedRateLimiter = Arc<DefaultDirectRateLimiter>;

/// Request ID made available to handlers through request extensions.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Reuse the caller's `X-Request-ID` or mint a UUID, record it on the
/// request span, store it as a [`RequestId`] extension and echo it on the
/// response.
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = tracing::info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Build a process-wide limiter; `None` when `requests_per_second` is zero.
pub fn create_rate_limiter(requests_per_second: u32) -> Option<SharedRateLimiter> {
    NonZeroU32::new(requests_per_second)
        .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

pub async fn rate_limit_middleware(
    State(limiter): State<SharedRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if limiter.check().is_err() {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.as_str())
            .unwrap_or("-");
        warn!(request_id, "rate limit exceeded");
        return AppError::new(
            StatusCode::TOO_MANY_REQUESTS,
            CODE_RATE_LIMITED,
            "Please reduce your request rate",
        )
        .into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Extension, Router, routing::get};
    use tower::ServiceExt;

    async fn echo_request_id(Extension(id): Extension<RequestId>) -> String {
        id.0
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo_request_id))
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn handlers_see_the_incoming_request_id() {
        let request = Request::builder()
            .uri("/")
            .header(&REQUEST_ID_HEADER, "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.headers()[&REQUEST_ID_HEADER], "req-42");
        assert_eq!(body_text(response).await, "req-42");
    }

    #[tokio::test]
    async fn generated_request_id_matches_response_header() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        let header = response.headers()[&REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        assert!(Uuid::parse_str(&header).is_ok());
        assert_eq!(body_text(response).await, header);
    }

    #[test]
    fn zero_rate_disables_the_limiter() {
        assert!(create_rate_limiter(0).is_none());
        assert!(create_rate_limiter(5).is_some());
    }
}
