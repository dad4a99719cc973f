//! Configuration Module
//!
//! # Interview Q&A
//!
//! Q: 환경변수 vs 설정 파일, 어떤 방식을 선택했고 왜인가?
//! A: 환경변수를 선택
//!    - 12-Factor App 원칙 준수
//!    - Docker/K8s 배포 시 환경별 설정 분리 용이
//!    - 로컬 개발은 `.env` 파일 (dotenvy)로 보완
//!
//! Q: 설정 검증은 어떻게 하는가?
//! A: from_env()에서 모든 값 검증 → 잘못되면 즉시 실패 (fail-fast)
//!    - 필수 값 누락: 변수 이름을 에러에 포함
//!    - 옵션 값 형식 오류도 기본값으로 조용히 대체하지 않고 실패
//!    - 소켓/DB 풀을 잡기 전에 실패하므로 정리할 리소스가 없음

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// 설정 에러
///
/// Display 문자열에는 항상 문제가 된 환경변수 이름이 들어간다.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required env var {var} is missing")]
    Missing { var: &'static str },

    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl ConfigError {
    /// 문제가 된 환경변수 이름
    pub fn var(&self) -> &'static str {
        match self {
            ConfigError::Missing { var } | ConfigError::Invalid { var, .. } => var,
        }
    }
}

/// 실행 환경 프로파일
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Prod,
    Dev,
    Debug,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "PROD",
            Environment::Dev => "DEV",
            Environment::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PROD" => Ok(Environment::Prod),
            "DEV" => Ok(Environment::Dev),
            "DEBUG" => Ok(Environment::Debug),
            _ => Err(()),
        }
    }
}

/// HTTP 서버 타임아웃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// 요청 처리 기본 타임아웃 (`HTTP_TIMEOUT`)
    pub timeout: Duration,
    /// 기본값: `timeout`
    pub read_timeout: Duration,
    /// 기본값: `timeout`. 핸들러 응답 제한 시간으로 적용됨
    pub write_timeout: Duration,
    /// 기본값: `timeout * 2`
    pub idle_timeout: Duration,
}

/// PostgreSQL 풀 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// 연결 문자열. `None`이면 영속성 기능 비활성화
    pub dsn: Option<String>,
    pub max_open_conns: u32,
    /// `max_open_conns` 이하로 clamp됨
    pub max_idle_conns: u32,
    pub conn_max_lifetime: Duration,
    /// 시작 시 연결 확인(`SELECT 1`) 제한 시간
    pub ping_timeout: Duration,
    pub auto_migrate: bool,
}

impl DatabaseConfig {
    pub fn is_enabled(&self) -> bool {
        self.dsn.is_some()
    }
}

/// 애플리케이션 설정
///
/// 시작 시 한 번 만들어지고 이후 변경되지 않는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_port: u16,
    pub environment: Environment,
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    /// tracing filter directive (예: `info`, `warn,ping_api=debug`)
    pub log_level: String,
    /// SIGTERM 이후 in-flight 요청을 기다리는 최대 시간
    pub shutdown_grace: Duration,
}

impl Config {
    pub const DEFAULT_MAX_OPEN_CONNS: u32 = 25;
    pub const DEFAULT_MAX_IDLE_CONNS: u32 = 5;
    pub const DEFAULT_CONN_MAX_LIFETIME: Duration = Duration::from_secs(60 * 60);
    pub const DEFAULT_DB_PING_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
    pub const DEFAULT_LOG_LEVEL: &'static str = "info";

    /// 환경변수에서 설정 로드
    ///
    /// # Required Environment Variables
    ///
    /// - `SERVER_PORT`: 1..=65535
    /// - `HTTP_TIMEOUT`: Go duration 형식 (`500ms`, `5s`, `1m`), 0보다 커야 함
    /// - `ENV`: `PROD` | `DEV` | `DEBUG` (대소문자 무시)
    ///
    /// # Optional Environment Variables
    ///
    /// - `DATABASE_DSN`: 비어 있으면 영속성 비활성화
    /// - `DB_MAX_OPEN_CONNS` (25), `DB_MAX_IDLE_CONNS` (5), `DB_CONN_MAX_LIFETIME` (1h)
    /// - `DB_PING_TIMEOUT` (5s), `AUTO_MIGRATE` (false)
    /// - `APP_LOG_LEVEL` (info)
    /// - `HTTP_READ_TIMEOUT` / `HTTP_WRITE_TIMEOUT` (= `HTTP_TIMEOUT`), `HTTP_IDLE_TIMEOUT` (= 2 × `HTTP_TIMEOUT`)
    /// - `SHUTDOWN_GRACE` (10s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 key → value 조회 함수로 설정 로드
    ///
    /// 테스트에서 프로세스 환경변수를 건드리지 않기 위해 분리.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let port_raw = env.required("SERVER_PORT")?;
        let server_port = match port_raw.trim().parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => return Err(invalid("SERVER_PORT", &port_raw, "must be an integer in 1..=65535")),
        };

        let timeout_raw = env.required("HTTP_TIMEOUT")?;
        let timeout = match parse_duration(&timeout_raw) {
            Some(d) if !d.is_zero() => d,
            _ => {
                return Err(invalid(
                    "HTTP_TIMEOUT",
                    &timeout_raw,
                    "use a positive Go duration, e.g. 10s, 500ms, 1m",
                ))
            }
        };

        let env_raw = env.required("ENV")?;
        let environment = env_raw
            .parse::<Environment>()
            .map_err(|_| invalid("ENV", &env_raw, "must be one of PROD|DEV|DEBUG"))?;

        let max_open_conns = env.u32_or("DB_MAX_OPEN_CONNS", Self::DEFAULT_MAX_OPEN_CONNS)?;
        if max_open_conns == 0 {
            return Err(invalid("DB_MAX_OPEN_CONNS", "0", "must be at least 1"));
        }
        let max_idle_conns = env
            .u32_or("DB_MAX_IDLE_CONNS", Self::DEFAULT_MAX_IDLE_CONNS)?
            .min(max_open_conns);

        Ok(Config {
            server_port,
            environment,
            http: HttpConfig {
                timeout,
                read_timeout: env.duration_or("HTTP_READ_TIMEOUT", timeout)?,
                write_timeout: env.duration_or("HTTP_WRITE_TIMEOUT", timeout)?,
                idle_timeout: env.duration_or("HTTP_IDLE_TIMEOUT", timeout * 2)?,
            },
            database: DatabaseConfig {
                dsn: env.optional("DATABASE_DSN"),
                max_open_conns,
                max_idle_conns,
                conn_max_lifetime: env
                    .duration_or("DB_CONN_MAX_LIFETIME", Self::DEFAULT_CONN_MAX_LIFETIME)?,
                ping_timeout: env.duration_or("DB_PING_TIMEOUT", Self::DEFAULT_DB_PING_TIMEOUT)?,
                auto_migrate: env.bool_or("AUTO_MIGRATE", false)?,
            },
            log_level: env
                .optional("APP_LOG_LEVEL")
                .unwrap_or_else(|| Self::DEFAULT_LOG_LEVEL.to_string()),
            shutdown_grace: env.duration_or("SHUTDOWN_GRACE", Self::DEFAULT_SHUTDOWN_GRACE)?,
        })
    }

    /// 모든 인터페이스에 바인딩 (`:port`)
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.server_port))
    }
}

fn invalid(var: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    }
}

/// lookup 함수 위의 얇은 헬퍼. 공백뿐인 값은 없는 것으로 취급
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, var: &str) -> Option<String> {
        (self.lookup)(var).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.optional(var).ok_or(ConfigError::Missing { var })
    }

    fn u32_or(&self, var: &'static str, default: u32) -> Result<u32, ConfigError> {
        match self.optional(var) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| invalid(var, &raw, "must be a non-negative integer")),
        }
    }

    fn bool_or(&self, var: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(var) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                _ => Err(invalid(var, &raw, "must be one of 1|0|true|false|yes|no")),
            },
        }
    }

    fn duration_or(&self, var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        match self.optional(var) {
            None => Ok(default),
            Some(raw) => parse_duration(&raw)
                .ok_or_else(|| invalid(var, &raw, "use a Go duration, e.g. 10s, 500ms, 1h30m")),
        }
    }
}

/// Go 스타일 duration 문자열 파싱 ("500ms", "5s", "1h30m", "1.5s")
///
/// 지원 단위: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`.
/// 단위 없는 값은 `"0"`만 허용한다.
///
/// # Returns
/// 파싱 성공 시 Some(Duration), 형식 오류/음수/overflow면 None
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut rest = s;
    let mut total_nanos = 0f64;

    while !rest.is_empty() {
        // 숫자 부분
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return None;
        }
        let value: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];

        // 단위 부분
        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        total_nanos += value * nanos_per_unit;
        rest = &rest[unit_len..];
    }

    if !total_nanos.is_finite() || total_nanos >= u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total_nanos.round() as u64))
}
