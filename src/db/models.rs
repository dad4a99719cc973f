//! Database Models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Ping 레코드
///
/// insert 한 번으로 생성되고, 이후 수정/삭제되지 않는다.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PingRecord {
    /// 서버(DB)에서 생성
    pub id: i64,

    /// 요청 메시지. 비어 있으면 "pong"
    pub message: String,

    /// 서버(DB)에서 생성
    pub created_at: DateTime<Utc>,
}
