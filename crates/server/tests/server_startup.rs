use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config
fn minimal_config(port: u16) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}
"#,
        port
    )
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_streamscout"))
        .env("STREAMSCOUT_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_server_starts_and_serves_health() {
    let port = get_available_port();
    let mut config_file = NamedTempFile::new().unwrap();
    write!(config_file, "{}", minimal_config(port)).unwrap();

    let mut server = spawn_server(config_file.path()).await;
    assert!(wait_for_server(port, 100).await, "Server did not start");

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["server"]["port"], port);

    server.kill().await.unwrap();
}

#[tokio::test]
async fn test_server_fails_on_missing_config() {
    let status = tokio::process::Command::new(env!("CARGO_BIN_EXE_streamscout"))
        .env("STREAMSCOUT_CONFIG", "/nonexistent/streamscout.toml")
        .env("RUST_LOG", "error")
        .status()
        .await
        .unwrap();

    assert!(!status.success());
}

#[tokio::test]
async fn test_server_fails_on_invalid_config() {
    let mut config_file = NamedTempFile::new().unwrap();
    write!(
        config_file,
        r#"
[resolver]
batch_size = 0
"#
    )
    .unwrap();

    let status = tokio::process::Command::new(env!("CARGO_BIN_EXE_streamscout"))
        .env("STREAMSCOUT_CONFIG", config_file.path())
        .env("RUST_LOG", "error")
        .status()
        .await
        .unwrap();

    assert!(!status.success());
}
