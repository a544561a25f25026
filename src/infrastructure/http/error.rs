//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::ApiResponse;
use crate::application::ApplicationError;

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
    ServiceUnavailable(String),
    GatewayTimeout(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::GatewayTimeout(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(status = status.as_u16(), error = %msg, "Bad request");
            }
            ApiError::NotFound(msg) => {
                tracing::warn!(status = status.as_u16(), error = %msg, "Resource not found");
            }
            ApiError::Internal(msg) => {
                tracing::error!(status = status.as_u16(), error = %msg, "Internal server error");
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(status = status.as_u16(), error = %msg, "Service unavailable");
            }
            ApiError::GatewayTimeout(msg) => {
                tracing::error!(status = status.as_u16(), error = %msg, "Request timed out");
            }
        }

        (status, Json(ApiResponse::error(self.message()))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            e @ ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            // 拒绝接纳与超时都返回 504
            ApplicationError::Overloaded(msg) => ApiError::GatewayTimeout(msg),
            ApplicationError::Timeout(msg) => ApiError::GatewayTimeout(msg),
            ApplicationError::EngineFailure(msg) => ApiError::Internal(msg),
            ApplicationError::EngineUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            e @ ApplicationError::StorageError(_) => ApiError::Internal(e.to_string()),
            e @ ApplicationError::InternalError(_) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApplicationError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                ApplicationError::not_found("Reference voice", "x"),
                StatusCode::NOT_FOUND,
            ),
            (
                ApplicationError::Overloaded("full".into()),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ApplicationError::Timeout("late".into()),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ApplicationError::EngineFailure("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApplicationError::EngineUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApplicationError::StorageError("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (app_err, expected) in cases {
            assert_eq!(ApiError::from(app_err).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body_uses_envelope() {
        let response = ApiError::BadRequest("'text' is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "'text' is required");
    }
}
