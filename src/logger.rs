//! Logging Module
//!
//! tracing-subscriber 전역 subscriber를 환경 프로파일별로 구성한다.
//!
//! | ENV   | 출력 형식           | 기본 필터                                   |
//! |-------|---------------------|---------------------------------------------|
//! | PROD  | JSON lines          | `APP_LOG_LEVEL`                             |
//! | DEV   | 사람이 읽는 console | `APP_LOG_LEVEL`, ping_api/tower_http=debug  |
//! | DEBUG | console + file:line | `APP_LOG_LEVEL`, ping_api=trace, sqlx=debug |
//!
//! `RUST_LOG`가 설정되어 있으면 계산된 필터 대신 사용한다.

use std::io::Write;
use std::str::FromStr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{Config, Environment};

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid APP_LOG_LEVEL {level:?}: {reason}")]
    InvalidLevel { level: String, reason: String },

    #[error("global logger already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// 환경별 filter directive 계산
pub fn filter_directive(config: &Config) -> String {
    let level = config.log_level.trim();
    match config.environment {
        Environment::Prod => level.to_string(),
        Environment::Dev => format!("{level},{CRATE_TARGET}=debug,tower_http=debug"),
        Environment::Debug => {
            format!("{level},{CRATE_TARGET}=trace,tower_http=debug,sqlx=debug")
        }
    }
}

/// `APP_LOG_LEVEL` 검증 후 EnvFilter 생성
///
/// 단일 값(`info`, `warn` ...)은 레벨로 해석되어야 한다. `loud`처럼
/// 오타가 난 값이 target 이름으로 조용히 받아들여지는 것을 막기 위함.
pub fn build_filter(config: &Config) -> Result<EnvFilter, LoggerError> {
    let level = config.log_level.trim();
    if !level.contains(['=', ',']) {
        LevelFilter::from_str(level).map_err(|e| LoggerError::InvalidLevel {
            level: level.to_string(),
            reason: e.to_string(),
        })?;
    }

    let filter = EnvFilter::try_new(filter_directive(config)).map_err(|e| {
        LoggerError::InvalidLevel {
            level: level.to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(EnvFilter::try_from_default_env().unwrap_or(filter))
}

/// 전역 subscriber 설치 (프로세스당 한 번)
pub fn init(config: &Config) -> Result<(), LoggerError> {
    let filter = build_filter(config)?;

    match config.environment {
        Environment::Prod => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_filter(filter),
            )
            .try_init()?,
        Environment::Dev => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_filter(filter))
            .try_init()?,
        Environment::Debug => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(filter),
            )
            .try_init()?,
    }

    Ok(())
}

/// 버퍼에 남은 로그 출력
///
/// 종료 시퀀스의 마지막 단계. 실패해도 보고할 곳이 없으므로 무시한다.
pub fn flush() {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(env: &str, level: Option<&str>) -> Config {
        let mut vars = HashMap::from([
            ("SERVER_PORT", "8080".to_string()),
            ("HTTP_TIMEOUT", "5s".to_string()),
            ("ENV", env.to_string()),
        ]);
        if let Some(level) = level {
            vars.insert("APP_LOG_LEVEL", level.to_string());
        }
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_prod_uses_app_log_level_only() {
        assert_eq!(filter_directive(&config("PROD", None)), "info");
        assert_eq!(filter_directive(&config("PROD", Some("warn"))), "warn");
    }

    #[test]
    fn test_dev_and_debug_raise_crate_verbosity() {
        let dev = filter_directive(&config("DEV", None));
        assert!(dev.starts_with("info,"));
        assert!(dev.contains("ping_api=debug"));
        assert!(dev.contains("tower_http=debug"));

        let debug = filter_directive(&config("DEBUG", Some("warn")));
        assert!(debug.starts_with("warn,"));
        assert!(debug.contains("ping_api=trace"));
        assert!(debug.contains("sqlx=debug"));
    }

    #[test]
    fn test_build_filter_accepts_levels_and_directives() {
        assert!(build_filter(&config("PROD", Some("debug"))).is_ok());
        assert!(build_filter(&config("PROD", Some("OFF"))).is_ok());
        assert!(build_filter(&config("DEV", Some("warn,sqlx=info"))).is_ok());
    }

    #[test]
    fn test_build_filter_rejects_unknown_level() {
        let err = build_filter(&config("PROD", Some("loud"))).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel { ref level, .. } if level == "loud"));
        assert!(err.to_string().contains("APP_LOG_LEVEL"));
    }

    #[test]
    fn test_build_filter_rejects_malformed_directive() {
        let err = build_filter(&config("PROD", Some("info,ping_api=[{"))).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel { .. }));
    }
}
