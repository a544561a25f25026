//! HTTP Middleware
//!
//! 4xx / 5xx 响应日志

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 记录错误状态码的请求
///
/// 业务错误的详细原因在 ApiError::into_response() 中记录，这里只补充
/// 方法、路径与耗时
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;

    fn create_test_router() -> Router {
        Router::new()
            .route("/ok", get(|| async { "OK" }))
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }))
            .route("/late", get(|| async { StatusCode::GATEWAY_TIMEOUT }))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        create_test_router()
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_passes_responses_through() {
        assert_eq!(status_of("/ok").await, StatusCode::OK);
        assert_eq!(status_of("/gone").await, StatusCode::NOT_FOUND);
        assert_eq!(status_of("/late").await, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_of("/missing").await, StatusCode::NOT_FOUND);
    }
}
