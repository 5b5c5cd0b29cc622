//! SSE transport integration: discovery, CORS, and session routing

mod common;

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use obsidian_mcp::mcp::transport::SseTransportHub;
use obsidian_mcp::mcp::ObsidianService;

/// Bind the hub's router on an ephemeral port, keeping the hub handle for
/// session-table assertions.
async fn spawn_hub(service: ObsidianService) -> (SseTransportHub, String) {
    let hub = SseTransportHub::new(service);
    let router = hub.router();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind hub");
    let addr = listener.local_addr().expect("hub addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("hub crashed");
    });
    (hub, format!("http://{addr}"))
}

/// Pull the next `event:`/`data:` block out of an SSE byte stream.
async fn next_event<S, B, E>(stream: &mut S, buffer: &mut String) -> (String, String)
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Debug,
{
    loop {
        if let Some(event) = take_event(buffer) {
            return event;
        }
        let chunk = tokio::time::timeout(Duration::from_secs(10), stream.next())
            .await
            .expect("timed out waiting for an sse event")
            .expect("sse stream ended")
            .expect("sse chunk");
        buffer.push_str(std::str::from_utf8(chunk.as_ref()).expect("utf8 chunk"));
    }
}

fn take_event(buffer: &mut String) -> Option<(String, String)> {
    loop {
        let end = buffer.find("\n\n")?;
        let block: String = buffer.drain(..end + 2).collect();
        let mut event = String::new();
        let mut data = String::new();
        for line in block.lines() {
            if let Some(rest) = line.strip_prefix("event:") {
                event = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
            }
        }
        // Skip comment-only keepalive blocks.
        if !event.is_empty() || !data.is_empty() {
            return Some((event, data));
        }
    }
}

#[tokio::test]
async fn discovery_document_and_cors_surface() {
    let vault = common::spawn_vault_stub().await;
    let (_hub, base) = spawn_hub(common::service_for(vault)).await;
    let http = reqwest::Client::new();

    let response = http.get(format!("{base}/")).send().await.expect("discovery");
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let doc: Value = response.json().await.expect("discovery json");
    assert_eq!(doc["schema_version"], "v1");
    assert_eq!(doc["protocol"], "mcp");
    assert_eq!(doc["server_name"], "Obsidian MCP");
    assert!(doc["server_version"].is_string());
    assert!(doc["description"].is_string());

    // Preflight short-circuits with no body before any route runs.
    let preflight = http
        .request(reqwest::Method::OPTIONS, format!("{base}/messages"))
        .send()
        .await
        .expect("preflight");
    assert_eq!(preflight.status(), 204);
    assert_eq!(
        preflight.headers()["access-control-allow-methods"],
        "GET, POST, OPTIONS"
    );
    assert_eq!(
        preflight.headers()["access-control-allow-headers"],
        "Content-Type"
    );
}

#[tokio::test]
async fn routes_messages_to_the_matching_session() {
    let vault = common::spawn_vault_stub().await;
    let (hub, base) = spawn_hub(common::service_for(vault)).await;
    let http = reqwest::Client::new();

    let response = http.get(format!("{base}/sse")).send().await.expect("open sse");
    assert_eq!(response.status(), 200);
    let mut stream = Box::pin(response.bytes_stream());
    let mut buffer = String::new();

    let (event, endpoint) = next_event(&mut stream, &mut buffer).await;
    assert_eq!(event, "endpoint");
    let session_id = endpoint.split("sessionId=").nth(1).expect("session id");
    assert!(!session_id.is_empty());
    assert_eq!(hub.session_count(), 1);

    // Initialize over the message endpoint; the response frame arrives on
    // this session's stream.
    let accepted = http
        .post(format!("{base}{endpoint}"))
        .json(&common::initialize_frame(0))
        .send()
        .await
        .expect("post initialize");
    assert_eq!(accepted.status(), 200);

    let (event, data) = next_event(&mut stream, &mut buffer).await;
    assert_eq!(event, "message");
    let frame: Value = serde_json::from_str(&data).expect("frame json");
    assert_eq!(frame["id"], 0);
    assert!(frame["result"].is_object(), "got: {frame}");

    let accepted = http
        .post(format!("{base}{endpoint}"))
        .json(&common::initialized_frame())
        .send()
        .await
        .expect("post initialized");
    assert_eq!(accepted.status(), 200);

    // A tool invocation round-trips through backend and formatter.
    let accepted = http
        .post(format!("{base}{endpoint}"))
        .json(&common::call_tool_frame(1, "obsidian_get_status", json!({})))
        .send()
        .await
        .expect("post tools/call");
    assert_eq!(accepted.status(), 200);

    let (event, data) = next_event(&mut stream, &mut buffer).await;
    assert_eq!(event, "message");
    let frame: Value = serde_json::from_str(&data).expect("frame json");
    assert_eq!(frame["id"], 1);
    let text = frame["result"]["content"][0]["text"]
        .as_str()
        .expect("text content");
    assert!(text.contains("obsidian-local-rest-api"), "got: {text}");

    // A stale or forged session id is a client error, and the table is
    // untouched.
    let bogus = http
        .post(format!("{base}/messages?sessionId=bogus"))
        .json(&common::tools_list_frame(9))
        .send()
        .await
        .expect("post to bogus session");
    assert_eq!(bogus.status(), 400);
    assert_eq!(hub.session_count(), 1);
}

#[tokio::test]
async fn concurrent_sessions_are_independent() {
    let vault = common::spawn_vault_stub().await;
    let (hub, base) = spawn_hub(common::service_for(vault)).await;
    let http = reqwest::Client::new();

    let first = http.get(format!("{base}/sse")).send().await.expect("first session");
    let mut first_stream = Box::pin(first.bytes_stream());
    let mut first_buffer = String::new();
    let (_, first_endpoint) = next_event(&mut first_stream, &mut first_buffer).await;

    let second = http.get(format!("{base}/sse")).send().await.expect("second session");
    let mut second_stream = Box::pin(second.bytes_stream());
    let mut second_buffer = String::new();
    let (_, second_endpoint) = next_event(&mut second_stream, &mut second_buffer).await;

    assert_ne!(first_endpoint, second_endpoint);
    assert_eq!(hub.session_count(), 2);

    // Closing the first connection removes only its table entry.
    drop(first_stream);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while hub.session_count() != 1 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "closed session was not removed from the table"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // The closed session's id no longer routes.
    let stale = http
        .post(format!("{base}{first_endpoint}"))
        .json(&common::initialize_frame(0))
        .send()
        .await
        .expect("post to closed session");
    assert_eq!(stale.status(), 400);

    // The surviving session still works.
    let accepted = http
        .post(format!("{base}{second_endpoint}"))
        .json(&common::initialize_frame(0))
        .send()
        .await
        .expect("post to live session");
    assert_eq!(accepted.status(), 200);
    let (event, data) = next_event(&mut second_stream, &mut second_buffer).await;
    assert_eq!(event, "message");
    let frame: Value = serde_json::from_str(&data).expect("frame json");
    assert_eq!(frame["id"], 0);
}
