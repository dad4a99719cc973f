//! Lifecycle state machine
//!
//! ```text
//! Starting ──► Serving ──► Draining ──► Stopped
//!    │            │
//!    └──► Failed ◄┘
//! ```
//!
//! `Lifecycle`은 `App`만 가지고 있으므로 상태를 바꿀 수 있는 곳은 하나뿐이다.
//! 바깥에서는 `watch::Receiver`로 구독만 가능.

use std::fmt;

use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Serving,
    Draining,
    Stopped,
    Failed,
}

impl LifecycleState {
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Starting, Serving)
                | (Starting, Failed)
                | (Serving, Draining)
                | (Serving, Failed)
                | (Draining, Stopped)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Serving => "serving",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 허용되지 않은 상태 전이 (프로그래밍 오류)
#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal lifecycle transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

pub(crate) struct Lifecycle {
    tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::Starting);
        Self { tx }
    }

    pub(crate) fn current(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    pub(crate) fn advance(&self, to: LifecycleState) -> Result<(), InvalidTransition> {
        let from = self.current();
        if !from.can_transition_to(to) {
            return Err(InvalidTransition { from, to });
        }

        self.tx.send_replace(to);
        debug!(%from, %to, "lifecycle transition");
        Ok(())
    }
}
