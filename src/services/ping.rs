//! Ping Service
//!
//! 빈 메시지를 "pong"으로 채우고 repository에 위임한다.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, Instrument};

use crate::context::RequestContext;
use crate::db::{PingRecord, PingRepository};

/// 메시지가 비어 있을 때 사용
pub const DEFAULT_MESSAGE: &str = "pong";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("create ping: {0}")]
    Create(#[source] sqlx::Error),
}

#[async_trait]
pub trait PingService: Send + Sync {
    async fn ping(&self, ctx: &RequestContext, message: &str) -> Result<PingRecord, ServiceError>;
}

pub struct Pinger<R> {
    repo: R,
}

impl<R: PingRepository> Pinger<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}

#[async_trait]
impl<R: PingRepository> PingService for Pinger<R> {
    async fn ping(&self, ctx: &RequestContext, message: &str) -> Result<PingRecord, ServiceError> {
        let message = if message.is_empty() { DEFAULT_MESSAGE } else { message };
        let span = tracing::info_span!(parent: ctx.span(), "ping_service", request_id = ctx.request_id());

        match self.repo.create(ctx, message).instrument(span.clone()).await {
            Ok(record) => {
                span.in_scope(|| info!(id = record.id, "ping created"));
                Ok(record)
            }
            Err(e) => {
                // ERROR 로그는 요청 경계(ApiError)에서 한 번만
                span.in_scope(|| debug!(error = %e, "create ping failed"));
                Err(ServiceError::Create(e))
            }
        }
    }
}
