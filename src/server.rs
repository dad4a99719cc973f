//! HTTP Server
//!
//! 바인딩(`HttpListener`)과 실행(`RunningServer`)을 분리한다.
//!
//! - 바인딩은 시작 단계의 마지막 작업 → 실패하면 startup 에러
//! - 실행은 별도 tokio task → 컨트롤러는 시그널/리스너 종료를 기다릴 수 있음
//! - 연결마다 task 하나. accept task가 `JoinSet`으로 전부 소유한다
//! - 종료는 grace period 제한: 넘기면 남은 연결 task를 abort하고 정리될 때까지 기다림
//!
//! ```text
//! Serving ──shutdown()──► Draining ──grace 초과──► Closing
//!   accept 중              리스너 닫힘              연결 task abort
//!                          연결별 graceful 종료
//! ```

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{extract::ConnectInfo, http::Request, Router};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tower::ServiceExt;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// graceful shutdown 중 발생한 문제. 로그로만 남기고 프로세스 종료 코드에는 반영하지 않음
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("in-flight requests still running after {0:?}; remaining connections forcibly closed")]
    GraceExceeded(Duration),

    #[error("listener failed during shutdown: {0}")]
    Listener(#[source] io::Error),

    #[error("listener task aborted during shutdown: {0}")]
    Task(#[source] JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Serving,
    Draining,
    Closing,
}

/// 바인딩만 된 소켓 (아직 accept하지 않음)
pub struct HttpListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl HttpListener {
    pub async fn bind(addr: SocketAddr) -> Result<Self, AppError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AppError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| AppError::Bind { addr, source })?;

        debug!(%local_addr, "listener bound");
        Ok(Self { listener, local_addr })
    }

    /// 실제로 바인딩된 주소 (포트 0으로 바인딩한 경우 OS가 고른 포트)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 별도 task에서 accept 시작
    pub fn serve(self, router: Router) -> RunningServer {
        let (phase_tx, phase_rx) = watch::channel(Phase::Serving);
        let task = tokio::spawn(accept_loop(self.listener, router, phase_rx));

        info!(addr = %self.local_addr, "listening");
        RunningServer {
            local_addr: self.local_addr,
            phase: phase_tx,
            task,
        }
    }
}

/// 백그라운드에서 실행 중인 서버
pub struct RunningServer {
    local_addr: SocketAddr,
    phase: watch::Sender<Phase>,
    task: JoinHandle<io::Result<()>>,
}

impl RunningServer {
    /// 이미 만들어진 serve task를 감싼다 (테스트에서 리스너 장애 시뮬레이션용)
    #[cfg(test)]
    pub(crate) fn from_task(local_addr: SocketAddr, task: JoinHandle<io::Result<()>>) -> Self {
        Self {
            local_addr,
            phase: watch::channel(Phase::Serving).0,
            task,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// serve task가 스스로 끝날 때까지 대기
    ///
    /// shutdown 요청 없이 끝났다면 무조건 비정상 종료다.
    /// `&mut JoinHandle`을 await하므로 `select!` 안에서 취소되어도 안전하다.
    pub async fn exited(&mut self) -> AppError {
        match (&mut self.task).await {
            Ok(Ok(())) => AppError::ListenerStopped,
            Ok(Err(e)) => AppError::Listener(e),
            Err(e) => AppError::ListenerTask(e),
        }
    }

    /// graceful shutdown
    ///
    /// 1. 리스너 소켓을 닫고 각 연결에 graceful 종료 요청 (진행 중인 요청은 계속)
    /// 2. 모든 연결이 끝나기를 최대 `grace`만큼 대기
    /// 3. 시간 초과 시 남은 연결 task를 abort → 정리 완료 후 `GraceExceeded`
    ///
    /// 반환 시점에는 어떤 핸들러도 더 이상 실행 중이지 않다.
    pub async fn shutdown(mut self, grace: Duration) -> Result<(), ShutdownError> {
        self.phase.send_replace(Phase::Draining);

        if let Ok(joined) = tokio::time::timeout(grace, &mut self.task).await {
            return flatten(joined);
        }

        warn!(?grace, "grace period exceeded, closing remaining connections");
        self.phase.send_replace(Phase::Closing);

        if let Err(e) = flatten((&mut self.task).await) {
            warn!(error = %e, "listener task failed while closing connections");
        }
        Err(ShutdownError::GraceExceeded(grace))
    }
}

fn flatten(joined: Result<io::Result<()>, JoinError>) -> Result<(), ShutdownError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ShutdownError::Listener(e)),
        Err(e) => Err(ShutdownError::Task(e)),
    }
}

/// 클라이언트 쪽 문제로 accept가 실패한 경우. 리스너는 멀쩡하므로 계속 진행
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

async fn accept_loop(
    listener: TcpListener,
    router: Router,
    mut phase: watch::Receiver<Phase>,
) -> io::Result<()> {
    let mut connections = JoinSet::new();

    // Serving
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, remote_addr)) => {
                    connections.spawn(serve_connection(stream, remote_addr, router.clone(), phase.clone()));
                }
                Err(e) if is_connection_error(&e) => debug!(error = %e, "accept failed"),
                Err(e) => return Err(e),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = phase.changed() => break,
        }
    }

    // Draining: 새 연결 거부
    drop(listener);
    debug!(connections = connections.len(), "listener closed, draining");

    let mut force = *phase.borrow_and_update() == Phase::Closing;
    while !force {
        tokio::select! {
            joined = connections.join_next() => {
                if joined.is_none() {
                    return Ok(());
                }
            }
            _ = phase.changed() => force = true,
        }
    }

    // Closing
    let remaining = connections.len();
    connections.abort_all();
    while connections.join_next().await.is_some() {}
    warn!(remaining, "connections forcibly closed");
    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    router: Router,
    mut phase: watch::Receiver<Phase>,
) {
    let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(remote_addr));
        router.clone().oneshot(request)
    });

    let builder = Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut draining = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    debug!(error = %e, %remote_addr, "connection error");
                }
                break;
            }
            _ = phase.changed(), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}
