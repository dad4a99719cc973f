//! Request Context
//!
//! 요청 단위 로깅 컨텍스트를 명시적으로 전달하기 위한 타입.
//! handler → service → repository 순서로 `&RequestContext`를 인자로 넘기고,
//! 각 계층은 `ctx.span()`의 자식 span 안에서 로그를 남긴다.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::Span;

/// 요청 ID 헤더 (요청에 없으면 미들웨어가 UUIDv4로 채움)
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    span: Span,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, span: Span) -> Self {
        Self {
            request_id: request_id.into(),
            span,
        }
    }

    /// HTTP 요청 밖에서 쓰는 컨텍스트 (테스트, 배치 작업 등)
    pub fn detached() -> Self {
        Self::new("-", Span::current())
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// TraceLayer가 만든 `http_request` span이 현재 span이므로 그대로 잡는다.
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        Ok(Self::new(request_id, Span::current()))
    }
}
