//! Ping Endpoint
//!
//! 쿼리의 `message`를 저장하고 생성된 레코드를 그대로 돌려준다.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{context::RequestContext, db::PingRecord, error::ApiError, AppState};

// ============ Request/Response Types ============

/// 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct PingQuery {
    /// 없거나 빈 문자열이면 "pong"
    pub message: Option<String>,
}

/// ping 응답
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub id: i64,
    pub message: String,
    /// RFC 3339
    pub created_at: String,
}

impl From<PingRecord> for PingResponse {
    fn from(record: PingRecord) -> Self {
        Self {
            id: record.id,
            message: record.message,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

// ============ Handlers ============

/// GET /api/v1/ping?message=<text>
///
/// # Response
///
/// ```json
/// {
///   "id": 1,
///   "message": "hello",
///   "created_at": "2024-06-01T12:00:00.000000+00:00"
/// }
/// ```
///
/// # Errors
///
/// - 400: 쿼리 문자열을 해석할 수 없음
/// - 500: 저장 실패 (상세 내용은 로그에만)
pub async fn ping(
    State(state): State<AppState>,
    ctx: RequestContext,
    query: Result<Query<PingQuery>, QueryRejection>,
) -> Result<Json<PingResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let message = query.message.unwrap_or_default();

    let record = state.service.ping(&ctx, &message).await?;

    Ok(Json(record.into()))
}
