//! HTTP metrics middleware.
//!
//! Applied as the outermost layer so that framework-level rejections
//! (415 wrong Content-Type, 422 JSON shape errors, 404, 405, timeouts) are
//! counted alongside handler responses.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Record method, normalized path, status and duration for every response.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    async fn handler_200() -> &'static str {
        "OK"
    }

    async fn handler_429() -> (StatusCode, &'static str) {
        (StatusCode::TOO_MANY_REQUESTS, "slow down")
    }

    fn test_app() -> Router {
        Router::new()
            .route("/api/v1/query", post(handler_200))
            .route("/api/v1/token", post(handler_429))
            .layer(middleware::from_fn(http_metrics_middleware))
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builder should succeed");

        test_app()
            .oneshot(request)
            .await
            .expect("request should succeed")
            .status()
    }

    #[tokio::test]
    async fn test_middleware_passes_responses_through() {
        assert_eq!(status_of("POST", "/api/v1/query").await, StatusCode::OK);
        assert_eq!(
            status_of("POST", "/api/v1/token").await,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_middleware_sees_framework_rejections() {
        assert_eq!(status_of("GET", "/nonexistent").await, StatusCode::NOT_FOUND);
        assert_eq!(
            status_of("GET", "/api/v1/query").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
