//! 실제 SIGTERM으로 종료 (프로세스 전체에 전달되므로 이 파일에는 테스트 하나만 둔다)
#![cfg(unix)]

use std::collections::HashMap;
use std::process::Command;
use std::time::Duration;

use ping_api::{App, Config, LifecycleState};

fn config() -> Config {
    let vars = HashMap::from([
        ("SERVER_PORT", "8080"),
        ("HTTP_TIMEOUT", "2s"),
        ("ENV", "DEV"),
        ("SHUTDOWN_GRACE", "2s"),
    ]);
    let mut config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
    config.server_port = 0;
    config
}

#[tokio::test]
async fn sigterm_drains_and_stops() {
    let mut app = App::new(config());
    let mut state = app.subscribe();
    app.start().await.unwrap();
    let port = app.local_addr().unwrap().port();

    let handle = tokio::spawn(app.run());

    // Serving이면 시그널 핸들러는 이미 등록된 상태
    state.wait_for(|s| *s == LifecycleState::Serving).await.unwrap();

    let response = reqwest::get(format!("http://127.0.0.1:{port}/api/v1/ping?message=before"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let result = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("run() should return after SIGTERM")
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(*state.borrow(), LifecycleState::Stopped);
    assert!(tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_err());
}
