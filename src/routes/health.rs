//! Health Check Endpoint
//!
//! # Interview Q&A
//!
//! Q: Health check 엔드포인트는 왜 필요한가?
//! A: 로드밸런서 / Kubernetes liveness/readiness 체크가 프로세스 상태를 확인하는 용도
//!
//! Q: DB가 죽어 있으면 503을 줘야 하지 않나?
//! A: 항상 200 + `status: "degraded"`
//!    - 프로세스는 살아 있으므로 liveness 실패로 재시작시키지 않음
//!    - 판단은 호출하는 쪽이 `database.connected`로 함
//!
//! Q: persistence가 꺼져 있으면?
//! A: `database.enabled = false`, status는 "healthy"

use std::time::Instant;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check 응답
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub database: DatabaseStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub enabled: bool,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match &state.db {
        Some(db) => {
            let started = Instant::now();
            let checked = tokio::time::timeout(state.config.database.ping_timeout, db.health_check()).await;

            match checked {
                Ok(Ok(())) => DatabaseStatus {
                    enabled: true,
                    connected: true,
                    latency_ms: Some(started.elapsed().as_millis() as u64),
                },
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "health check: database query failed");
                    DatabaseStatus {
                        enabled: true,
                        connected: false,
                        latency_ms: None,
                    }
                }
                Err(_) => {
                    tracing::warn!("health check: database timed out");
                    DatabaseStatus {
                        enabled: true,
                        connected: false,
                        latency_ms: None,
                    }
                }
            }
        }
        None => DatabaseStatus {
            enabled: false,
            connected: false,
            latency_ms: None,
        },
    };

    let healthy = !database.enabled || database.connected;

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.to_string(),
        database,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
