//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/health` - 헬스 체크
//! - `/api/v1/ping` - ping 레코드 생성
//!
//! # Middleware (바깥쪽부터)
//! 1. `x-request-id` 생성 (요청에 있으면 그대로 사용)
//! 2. `x-request-id` 응답 헤더로 전파
//! 3. TraceLayer: 요청 span (`method`, `path`, `ip`, `request_id`) + 완료 로그
//!    (5xx 상세는 `ApiError`가 ERROR로 한 번만 남김)
//! 4. panic → 500
//! 5. 핸들러 타임아웃 (`HTTP_WRITE_TIMEOUT`) → 408

pub mod health;
pub mod ping;

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderValue, Request},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{Level, Span};
use uuid::Uuid;

use crate::context::REQUEST_ID_HEADER;
use crate::AppState;

/// 라우터 생성
///
/// # Route Structure
///
/// ```text
/// GET  /health                      - 서버 상태 확인
/// GET  /api/v1/ping?message=<text>  - ping 생성 (message 없으면 "pong")
/// ```
pub fn router(state: AppState) -> Router {
    let timeout = state.config.http.write_timeout;

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // API v1
        .nest("/api/v1", api_v1())
        // 미들웨어
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(make_request_span)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        )
                        .on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
                )
                .layer(CatchPanicLayer::new())
                .layer(TimeoutLayer::new(timeout)),
        )
        // 상태 주입
        .with_state(state)
}

fn api_v1() -> Router<AppState> {
    Router::new().route("/ping", get(ping::ping))
}

/// 요청 ID 생성기 (UUIDv4)
#[derive(Clone, Copy, Default)]
struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, _: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// 요청 단위 span. 하위 계층은 `RequestContext`로 이 span을 넘겨받는다.
fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let ip = client_ip(request).map_or_else(|| "-".to_string(), |ip| ip.to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        ip = %ip,
        request_id
    )
}

/// 서버가 연결마다 넣어주는 `ConnectInfo`에서 클라이언트 IP 조회
fn client_ip<B>(request: &Request<B>) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}
