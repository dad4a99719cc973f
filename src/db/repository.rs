//! Repository Pattern Implementation
//!
//! # Interview Q&A
//!
//! Q: Repository 패턴을 쓰는 이유는?
//! A: 데이터 접근 로직을 서비스에서 분리
//!    - 서비스는 `PingRepository` trait만 앎
//!    - 운영: `PgPingRepository` (PostgreSQL)
//!    - DATABASE_DSN 없음 / 테스트: `MemoryPingRepository`
//!
//! Q: 커넥션은 언제 잡는가?
//! A: 쿼리 하나 동안만. 요청 사이에 트랜잭션이나 락을 들고 있지 않음

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, Instrument};

use super::{models::PingRecord, Database};
use crate::context::RequestContext;

/// Ping Repository 인터페이스
#[async_trait]
pub trait PingRepository: Send + Sync {
    /// 한 행 insert 후 생성된 id / created_at 포함 레코드 반환
    async fn create(&self, ctx: &RequestContext, message: &str) -> Result<PingRecord, sqlx::Error>;
}

const INSERT_PING_SQL: &str =
    "INSERT INTO pings (message) VALUES ($1) RETURNING id, message, created_at";

/// PostgreSQL 구현
pub struct PgPingRepository {
    db: Database,
}

impl PgPingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PingRepository for PgPingRepository {
    async fn create(&self, ctx: &RequestContext, message: &str) -> Result<PingRecord, sqlx::Error> {
        let span = tracing::debug_span!(parent: ctx.span(), "ping_repo", request_id = ctx.request_id());

        async move {
            let start = Instant::now();
            debug!(message, "create ping");

            let record = sqlx::query_as::<_, PingRecord>(INSERT_PING_SQL)
                .bind(message)
                .fetch_one(self.db.pool())
                .await?;

            info!(
                id = record.id,
                latency_ms = start.elapsed().as_millis() as u64,
                "ping inserted"
            );
            Ok(record)
        }
        .instrument(span)
        .await
    }
}

/// 프로세스 메모리 구현
///
/// 영속성이 꺼져 있을 때(DATABASE_DSN 없음) 사용한다.
/// id는 1부터 순차 증가, created_at은 현재 시각. 레코드는 보관하지 않는다.
#[derive(Debug)]
pub struct MemoryPingRepository {
    next_id: AtomicI64,
}

impl MemoryPingRepository {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
        }
    }

    /// 지금까지 생성된 레코드 수
    pub fn created(&self) -> i64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }
}

impl Default for MemoryPingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PingRepository for MemoryPingRepository {
    async fn create(&self, ctx: &RequestContext, message: &str) -> Result<PingRecord, sqlx::Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        ctx.span().in_scope(|| debug!(id, message, "ping kept in memory"));

        Ok(PingRecord {
            id,
            message: message.to_string(),
            created_at: Utc::now(),
        })
    }
}

// 테스트용 Mock 구현:


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_repository_assigns_sequential_ids() {
        let repo = MemoryPingRepository::new();
        let ctx = RequestContext::detached();

        let first = repo.create(&ctx, "a").await.unwrap();
        let second = repo.create(&ctx, "b").await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(first.message, "a");
        assert_eq!(second.id, 2);
        assert!(second.created_at >= first.created_at);
        assert_eq!(repo.created(), 2);
    }

    #[tokio::test]
    async fn test_memory_repository_ids_unique_under_concurrency() {
        let repo = std::sync::Arc::new(MemoryPingRepository::new());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.create(&RequestContext::detached(), "x").await.unwrap().id
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), 32);
        assert_eq!(repo.created(), 32);
    }
}
