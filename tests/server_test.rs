//! End-to-end tests for the reports HTTP adapter.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use truespec::config::ServerConfig;
use truespec::server::{build_router, AppState};
use truespec::store::MemoryReportStore;

async fn start_server(config: ServerConfig) -> std::net::SocketAddr {
    let state = AppState::new(Arc::new(MemoryReportStore::new()), Arc::new(config));
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&Value>,
) -> (u16, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in headers {
        req.push_str(&format!("{name}: {value}\r\n"));
    }
    if body.is_some() {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", payload.len()));
    }
    req.push_str("\r\n");
    req.push_str(&payload);

    stream.write_all(req.as_bytes()).await.expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, body.to_string())
}

fn ingest_body() -> Value {
    json!({
        "base": {"paths": {"/pets": {"get": {"responses": {"200": {}}}}}},
        "head": {"paths": {}},
        "repo": "acme/api",
        "source": "ci"
    })
}

#[tokio::test]
async fn post_reports_runs_the_diff_and_persists() {
    let addr = start_server(ServerConfig {
        admin_token: Some("admin".into()),
        ..ServerConfig::default()
    })
    .await;

    let (status, body) = send_raw(addr, "POST", "/reports", &[], Some(&ingest_body())).await;
    assert_eq!(status, 200);
    let response: Value = serde_json::from_str(&body).expect("response json");
    assert_eq!(response["repo"], "acme/api");
    assert_eq!(response["summary"]["breaking"], 1);
    assert_eq!(response["summary"]["total"], 1);
    assert_eq!(response["items"][0]["code"], "operation-removed");
    assert!(response["markdown"]
        .as_str()
        .unwrap()
        .starts_with("## TrueSpec Summary\n"));
    let report_id = response["reportId"].as_str().expect("report id");

    // The persisted report is retrievable with the admin token.
    let (status, body) = send_raw(
        addr,
        "GET",
        &format!("/reports/{report_id}"),
        &[("X-Report-Token", "admin")],
        None,
    )
    .await;
    assert_eq!(status, 200);
    let stored: Value = serde_json::from_str(&body).expect("stored json");
    assert_eq!(stored["reportId"], report_id);
    assert_eq!(stored["source"], "ci");
    assert_eq!(stored["markdownTruncated"], false);
    assert_eq!(stored["items"][0]["code"], "operation-removed");
}

#[tokio::test]
async fn post_reports_accepts_string_specs() {
    let addr = start_server(ServerConfig::default()).await;
    let body = json!({
        "base": "{\"paths\": {\"/pets\": {\"get\": {}}}}",
        "head": "paths: {}\n",
        "repo": "acme/api"
    });

    let (status, response) = send_raw(addr, "POST", "/reports", &[], Some(&body)).await;
    assert_eq!(status, 200);
    let response: Value = serde_json::from_str(&response).expect("response json");
    assert_eq!(response["summary"]["breaking"], 1);
}

#[tokio::test]
async fn post_reports_rejects_unparseable_specs() {
    let addr = start_server(ServerConfig::default()).await;

    let (status, body) = send_raw(
        addr,
        "POST",
        "/reports",
        &[],
        Some(&json!({"base": {"paths": {}}, "head": 42})),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body.contains("head"));

    let (status, _) = send_raw(
        addr,
        "POST",
        "/reports",
        &[],
        Some(&json!({"head": {"paths": {}}})),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn ingest_token_guards_post_when_configured() {
    let addr = start_server(ServerConfig {
        ingest_token: Some("hook".into()),
        ..ServerConfig::default()
    })
    .await;

    let (status, _) = send_raw(addr, "POST", "/reports", &[], Some(&ingest_body())).await;
    assert_eq!(status, 403);

    let (status, _) = send_raw(
        addr,
        "POST",
        "/reports",
        &[("X-Report-Token", "hook")],
        Some(&ingest_body()),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = send_raw(
        addr,
        "POST",
        "/reports",
        &[("Authorization", "Bearer hook")],
        Some(&ingest_body()),
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn read_endpoints_refuse_without_admin_token() {
    // No admin token configured: reads always refuse.
    let addr = start_server(ServerConfig::default()).await;
    let (status, _) = send_raw(addr, "GET", "/reports?repo=acme%2Fapi", &[], None).await;
    assert_eq!(status, 403);
    let (status, _) = send_raw(addr, "GET", "/reports/some-id", &[], None).await;
    assert_eq!(status, 403);

    // Configured but wrong token still refuses.
    let addr = start_server(ServerConfig {
        admin_token: Some("admin".into()),
        ..ServerConfig::default()
    })
    .await;
    let (status, _) = send_raw(
        addr,
        "GET",
        "/reports?repo=acme%2Fapi",
        &[("X-Report-Token", "wrong")],
        None,
    )
    .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn listing_pages_report_stubs() {
    let addr = start_server(ServerConfig {
        admin_token: Some("admin".into()),
        ..ServerConfig::default()
    })
    .await;

    for _ in 0..3 {
        let (status, _) = send_raw(addr, "POST", "/reports", &[], Some(&ingest_body())).await;
        assert_eq!(status, 200);
    }

    let (status, body) = send_raw(
        addr,
        "GET",
        "/reports?repo=acme%2Fapi&limit=2",
        &[("X-Report-Token", "admin")],
        None,
    )
    .await;
    assert_eq!(status, 200);
    let page: Value = serde_json::from_str(&body).expect("page json");
    let items = page["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    // Stubs carry counts but not the heavy fields.
    assert_eq!(items[0]["summary"]["breaking"], 1);
    assert!(items[0].get("markdown").is_none());
    let token = page["nextRowKey"].as_str().expect("continuation");

    let (status, body) = send_raw(
        addr,
        "GET",
        &format!("/reports?repo=acme%2Fapi&limit=2&nextRowKey={token}"),
        &[("X-Report-Token", "admin")],
        None,
    )
    .await;
    assert_eq!(status, 200);
    let page: Value = serde_json::from_str(&body).expect("page json");
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert!(page["nextRowKey"].is_null());
}

#[tokio::test]
async fn unknown_report_is_404_and_unknown_method_405() {
    let addr = start_server(ServerConfig {
        admin_token: Some("admin".into()),
        ..ServerConfig::default()
    })
    .await;

    let (status, _) = send_raw(
        addr,
        "GET",
        "/reports/no-such-id",
        &[("X-Report-Token", "admin")],
        None,
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = send_raw(addr, "DELETE", "/reports", &[], None).await;
    assert_eq!(status, 405);
}

#[tokio::test]
async fn healthz_is_open() {
    let addr = start_server(ServerConfig::default()).await;
    let (status, body) = send_raw(addr, "GET", "/healthz", &[], None).await;
    assert_eq!(status, 200);
    assert!(body.contains("ok"));
}
