mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await?;

    // Storage is unreachable in this harness, so degraded is expected
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    assert!(body["data"]["status"].is_string());
    Ok(())
}

#[tokio::test]
async fn root_is_not_tenant_gated() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/"))
        .header("X-Database", "initech")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Pooper API");
    Ok(())
}

#[tokio::test]
async fn server_process_stops_when_dropped() -> Result<()> {
    let server = common::spawn_server().await?;
    let port = server.port;
    let tenants_file = server.tenants_file.clone();

    drop(server);

    assert!(std::net::TcpStream::connect(("127.0.0.1", port)).is_err());
    assert!(!tenants_file.exists());
    Ok(())
}
