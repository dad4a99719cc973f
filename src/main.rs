//! Ping Service Server
//!
//! ```text
//! main
//!  └─ bootstrap
//!      ├─ Config::from_env     (.env → 환경변수)
//!      ├─ logger::init         (ENV에 따라 JSON / text)
//!      ├─ App::start           (DB → 마이그레이션 → 라우터 → 바인딩)
//!      └─ App::run             (SIGINT/SIGTERM 대기 → drain)
//! ```
//!
//! 에러가 반환되면 non-zero exit code로 종료한다.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드 (.env 파일이 없어도 무시)
    dotenvy::dotenv().ok();

    ping_api::app::bootstrap().await?;

    Ok(())
}
