//! Error Handling Module
//!
//! Two taxonomies:
//! - `ApiError`: request boundary. Mapped to a small fixed set of HTTP statuses.
//! - `AppError`: process level (startup / run). Every variant is fatal and ends
//!   the process with a non-zero exit code.
//!
//! Shutdown problems (`server::ShutdownError`) are logged, never returned.

use std::io;
use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::migrate::MigrateError;
use thiserror::Error;
use tokio::task::JoinError;

use crate::app::InvalidTransition;
use crate::config::ConfigError;
use crate::db::ConnectError;
use crate::logger::LoggerError;
use crate::services::ServiceError;

/// API 에러 타입
///
/// # Design Decision
///
/// 응답 본문은 plain text.
/// 내부 에러 상세는 로그에만 남기고 클라이언트에는 노출하지 않음
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // ============ 500 Internal Server Error ============
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Internal(detail) => {
                // 현재 요청 span 안에서 호출되므로 request_id가 함께 기록됨
                tracing::error!(%detail, "request failed");
                "internal server error".to_string()
            }
        };

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// 프로세스 수준 에러 (startup / run)
#[derive(Debug, Error)]
pub enum AppError {
    // ============ Startup ============
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logger setup failed: {0}")]
    Logger(#[from] LoggerError),

    #[error("database setup failed: {0}")]
    Database(#[from] ConnectError),

    #[error("migration failed: {0}")]
    Migration(#[from] MigrateError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to register signal handlers: {0}")]
    Signal(#[source] io::Error),

    // ============ Runtime ============
    #[error("listener failed: {0}")]
    Listener(#[source] io::Error),

    #[error("listener task aborted: {0}")]
    ListenerTask(#[from] JoinError),

    #[error("listener stopped without a shutdown request")]
    ListenerStopped,

    #[error(transparent)]
    Lifecycle(#[from] InvalidTransition),
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::Internal("connection reset by peer".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body_text(response).await, "internal server error");
    }

    #[tokio::test]
    async fn test_bad_request_echoes_message() {
        let response = ApiError::BadRequest("bad query".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "bad query");
    }

    #[test]
    fn test_service_error_maps_to_internal() {
        let err: ApiError = ServiceError::Create(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, ApiError::Internal(ref detail) if detail.starts_with("create ping:")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_config_error_message_names_variable() {
        let err: AppError = ConfigError::Missing { var: "SERVER_PORT" }.into();
        assert!(err.to_string().contains("SERVER_PORT"));
    }
}
