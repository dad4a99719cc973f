//! Ping Service Library
//!
//! # Overview
//!
//! `GET /api/v1/ping` 하나를 제공하는 서비스 템플릿.
//! 핵심은 엔드포인트가 아니라 프로세스 수명 관리(시작 순서, graceful shutdown)다.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     App (lifecycle)                  │
//! │   Starting → Serving → Draining → Stopped / Failed   │
//! │                                                      │
//! │  ┌─────────┐   ┌──────────┐   ┌──────────────────┐   │
//! │  │ Routes  │──►│ Services │──►│ DB (Repository)  │   │
//! │  └─────────┘   └──────────┘   └──────────────────┘   │
//! │       ▲                                              │
//! │  ┌────┴────┐                                         │
//! │  │ Server  │  HttpListener / RunningServer           │
//! │  └─────────┘                                         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `app`: 라이프사이클 컨트롤러, 시그널 처리
//! - `config`: 환경 설정 관리
//! - `logger`: tracing subscriber 설정 (PROD / DEV / DEBUG)
//! - `context`: 요청 단위 로깅 컨텍스트
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `server`: 리스너 바인딩 및 graceful shutdown
//! - `services`: 비즈니스 로직
//! - `db`: 데이터베이스 연동
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ping_api::{App, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let mut app = App::new(config);
//!     app.start().await?;
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod app;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod logger;
pub mod routes;
pub mod server;
pub mod services;

// Re-exports for convenience
pub use app::{App, LifecycleState};
pub use config::Config;
pub use db::Database;
pub use error::{ApiError, AppError};

use services::PingService;

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn PingService>,
    /// persistence가 꺼져 있으면 `None`
    pub db: Option<Database>,
    pub config: Arc<Config>,
}
