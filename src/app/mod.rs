//! Application Lifecycle Controller
//!
//! # Interview Q&A
//!
//! Q: 의존성은 어떤 순서로 만드는가?
//! A: config → logger → DB 풀 → (마이그레이션) → 서비스/라우터 → 리스너 바인딩
//!    - 앞 단계가 실패하면 다음 단계는 실행하지 않음
//!    - 리스너 바인딩이 마지막이므로, 실패한 시작이 포트를 열어둔 채로 남지 않음
//!
//! Q: 종료는 어떻게 처리하는가?
//! A: 두 이벤트 중 먼저 온 것 하나만 처리 (`tokio::select!`)
//!    1. SIGINT/SIGTERM → Draining → graceful shutdown
//!    2. 리스너가 스스로 종료 → Failed → 에러 반환 (drain 없음)
//!
//! Q: graceful shutdown 순서는?
//! A: 리스너 drain → DB 풀 종료 → 로그 flush
//!    - in-flight 요청이 마지막까지 DB를 쓰고 로그를 남길 수 있어야 함
//!    - drain은 `SHUTDOWN_GRACE` (기본 10초)로 제한, 넘기면 강제 종료 후 에러 로그

mod lifecycle;
mod signal;

pub use lifecycle::{InvalidTransition, LifecycleState};
pub use signal::ShutdownSignals;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::{Database, MemoryPingRepository, PgPingRepository};
use crate::error::AppError;
use crate::logger;
use crate::routes;
use crate::server::{HttpListener, RunningServer};
use crate::services::{PingService, Pinger};
use crate::AppState;
use lifecycle::Lifecycle;

/// 풀 종료 대기 상한. drain 이후에도 반납되지 않은 커넥션이 있으면 포기
const POOL_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// 환경변수에서 시작해 종료까지 전체 실행
///
/// `main`에서 호출한다. 반환된 에러는 모두 non-zero exit code로 이어짐.
pub async fn bootstrap() -> Result<(), AppError> {
    let config = Config::from_env()?;
    logger::init(&config)?;

    info!(
        env = %config.environment,
        port = config.server_port,
        timeout = ?config.http.timeout,
        persistence = config.database.is_enabled(),
        "app starting"
    );

    let mut app = App::new(config);
    app.start().await?;
    app.run().await
}

/// 프로세스 수명 전체를 관리하는 컨트롤러
pub struct App {
    config: Arc<Config>,
    lifecycle: Lifecycle,
    db: Option<Database>,
    /// 지정하지 않으면 DB 유무에 따라 Pinger<Pg|Memory>
    service: Option<Arc<dyn PingService>>,
    listener: Option<HttpListener>,
    router: Option<Router>,
}

impl App {
    /// `Starting` 상태. 아직 아무 리소스도 잡지 않음
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            lifecycle: Lifecycle::new(),
            db: None,
            service: None,
            listener: None,
            router: None,
        }
    }

    /// 기본 ping 서비스 대신 주어진 구현으로 라우터를 구성
    pub fn with_service(config: Config, service: Arc<dyn PingService>) -> Self {
        Self {
            service: Some(service),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.current()
    }

    /// 상태 변화 구독 (App이 drop된 뒤에도 마지막 상태를 읽을 수 있음)
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// 바인딩된 주소 (`start` 성공 후에만 Some)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(HttpListener::local_addr)
    }

    /// 의존성 생성 + 리스너 바인딩
    ///
    /// 실패하면 이미 잡은 리소스를 모두 풀고 `Failed`로 전이한다.
    pub async fn start(&mut self) -> Result<(), AppError> {
        let state = self.state();
        if state != LifecycleState::Starting || self.listener.is_some() {
            return Err(InvalidTransition {
                from: state,
                to: LifecycleState::Serving,
            }
            .into());
        }

        match self.acquire().await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(error = %e, "startup failed");
                self.release().await;
                self.lifecycle.advance(LifecycleState::Failed)?;
                Err(e)
            }
        }
    }

    async fn acquire(&mut self) -> Result<(), AppError> {
        let config = self.config.clone();

        // 1. 데이터베이스
        match config.database.dsn.as_deref() {
            Some(dsn) => {
                let db = Database::connect(dsn, &config.database).await?;
                // 마이그레이션이 실패해도 release()에서 닫을 수 있도록 먼저 보관
                self.db = Some(db.clone());
                info!(
                    max_open = config.database.max_open_conns,
                    max_idle = config.database.max_idle_conns,
                    max_lifetime = ?config.database.conn_max_lifetime,
                    "database connected"
                );

                if config.database.auto_migrate {
                    db.run_migrations().await?;
                    info!("migrations applied");
                }
            }
            None => {
                warn!("DATABASE_DSN is empty, persistence disabled");
                if config.database.auto_migrate {
                    warn!("AUTO_MIGRATE ignored: persistence disabled");
                }
            }
        }

        // 2. 서비스 / 라우터
        let service: Arc<dyn PingService> = match (self.service.clone(), &self.db) {
            (Some(service), _) => service,
            (None, Some(db)) => Arc::new(Pinger::new(PgPingRepository::new(db.clone()))),
            (None, None) => Arc::new(Pinger::new(MemoryPingRepository::new())),
        };
        let router = routes::router(AppState {
            service,
            db: self.db.clone(),
            config: config.clone(),
        });

        // 3. 리스너 (마지막)
        let listener = HttpListener::bind(config.bind_addr()).await?;
        self.listener = Some(listener);
        self.router = Some(router);

        Ok(())
    }

    async fn release(&mut self) {
        self.listener = None;
        self.router = None;
        if let Some(db) = self.db.take() {
            db.close().await;
        }
    }

    /// SIGINT/SIGTERM을 받을 때까지 서비스
    pub async fn run(mut self) -> Result<(), AppError> {
        // 리스너가 accept를 시작하기 전에 등록
        let signals = match ShutdownSignals::register() {
            Ok(signals) => signals,
            Err(e) => {
                self.release().await;
                self.lifecycle.advance(LifecycleState::Failed)?;
                return Err(AppError::Signal(e));
            }
        };

        self.run_until(signals.recv()).await
    }

    /// `shutdown` future가 완료되거나 리스너가 죽을 때까지 서비스
    ///
    /// 두 이벤트 중 정확히 하나만 처리된다. `self`를 소비하므로 종료가 두 번 실행될 수 없다.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), AppError>
    where
        F: Future,
    {
        let (Some(listener), Some(router)) = (self.listener.take(), self.router.take()) else {
            return Err(InvalidTransition {
                from: self.state(),
                to: LifecycleState::Serving,
            }
            .into());
        };

        let mut server = listener.serve(router);
        self.lifecycle.advance(LifecycleState::Serving)?;

        let http = &self.config.http;
        info!(
            env = %self.config.environment,
            addr = %server.local_addr(),
            timeout = ?http.timeout,
            read_timeout = ?http.read_timeout,
            write_timeout = ?http.write_timeout,
            idle_timeout = ?http.idle_timeout,
            "app serving"
        );

        match supervise(&mut server, shutdown).await {
            Trigger::Shutdown => {
                self.lifecycle.advance(LifecycleState::Draining)?;
                info!("shutdown signal received");
                self.drain(server).await
            }
            Trigger::ListenerExited(e) => {
                self.lifecycle.advance(LifecycleState::Failed)?;
                error!(error = %e, "listener exited unexpectedly");
                logger::flush();
                Err(e)
            }
        }
    }

    /// 리스너 drain → DB 풀 종료 → 로그 flush → Stopped
    async fn drain(mut self, server: RunningServer) -> Result<(), AppError> {
        let grace = self.config.shutdown_grace;
        match server.shutdown(grace).await {
            Ok(()) => info!("server stopped gracefully"),
            Err(e) => error!(error = %e, "server shutdown error"),
        }

        if let Some(db) = self.db.take() {
            match tokio::time::timeout(POOL_CLOSE_TIMEOUT, db.close()).await {
                Ok(()) => info!("database pool closed"),
                Err(_) => warn!(timeout = ?POOL_CLOSE_TIMEOUT, "database pool did not close in time"),
            }
        }

        info!("shutdown complete");
        logger::flush();
        self.lifecycle.advance(LifecycleState::Stopped)?;
        Ok(())
    }
}

/// 먼저 발생한 종료 원인
#[derive(Debug)]
pub(crate) enum Trigger {
    Shutdown,
    ListenerExited(AppError),
}

/// 시그널과 리스너 종료 중 먼저 온 하나를 반환 (one-shot select)
pub(crate) async fn supervise<F>(server: &mut RunningServer, shutdown: F) -> Trigger
where
    F: Future,
{
    tokio::select! {
        _ = shutdown => Trigger::Shutdown,
        e = server.exited() => Trigger::ListenerExited(e),
    }
}
