//! Shared helpers for transport integration tests
#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use obsidian_mcp::core::client::VaultClient;
use obsidian_mcp::core::config::ServerConfig;
use obsidian_mcp::mcp::ObsidianService;

/// Serve a minimal Local REST API lookalike on an ephemeral port.
pub async fn spawn_vault_stub() -> SocketAddr {
    let app = Router::new()
        .route(
            "/",
            get(|| async {
                Json(json!({
                    "authenticated": true,
                    "ok": "true",
                    "service": "obsidian-local-rest-api",
                    "versions": {"obsidian": "1.5.0", "self": "3.0.0"}
                }))
            }),
        )
        .route("/active/", get(|| async { "# Active File Content" }));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind vault stub");
    let addr = listener.local_addr().expect("vault stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("vault stub crashed");
    });
    addr
}

/// A service wired to the stub backend.
pub fn service_for(addr: SocketAddr) -> ObsidianService {
    let config = ServerConfig::resolve(
        Some(format!("http://{addr}")),
        Some("test-key".into()),
        None,
    )
    .expect("test config");
    let client = VaultClient::new(&config).expect("vault client");
    ObsidianService::new(client)
}

pub fn initialize_frame(id: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": {"name": "integration-test", "version": "0.0.0"}
        }
    })
}

pub fn initialized_frame() -> Value {
    json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
}

pub fn tools_list_frame(id: i64) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": "tools/list", "params": {}})
}

pub fn call_tool_frame(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}
