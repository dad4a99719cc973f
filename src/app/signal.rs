//! Termination signals
//!
//! SIGTERM / SIGINT 핸들러를 리스너 시작 전에 등록한다.
//! 등록 시점 이후의 시그널은 `recv()`를 나중에 호출해도 놓치지 않는다.

use std::io;

use tracing::info;

/// 등록이 끝난 시그널 스트림
pub struct ShutdownSignals {
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    /// 핸들러 등록. OS 리소스 부족 등으로 실패하면 에러 반환
    #[cfg(unix)]
    pub fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    pub fn register() -> io::Result<Self> {
        Ok(Self {})
    }

    /// 둘 중 먼저 오는 시그널을 기다림. 받은 시그널 이름 반환
    #[cfg(unix)]
    pub async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => {
                info!("Received SIGTERM");
                "SIGTERM"
            }
            _ = self.sigint.recv() => {
                info!("Received SIGINT");
                "SIGINT"
            }
        }
    }

    /// Ctrl+C (Windows)
    #[cfg(not(unix))]
    pub async fn recv(self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to wait for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C");
        "CTRL_C"
    }
}
