//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `PingService`: ping 메시지 기본값 처리 후 저장

mod ping;

pub use ping::{PingService, Pinger, ServiceError, DEFAULT_MESSAGE};
