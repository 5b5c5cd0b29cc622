//! Multi-client MCP transport over HTTP server-sent events
//!
//! Each `GET /sse` opens one session: the response stream carries MCP
//! frames to the client, and the client POSTs its frames to `/messages`
//! with the session id it was handed in the initial `endpoint` event. The
//! hub owns the session table; an entry is removed only when its stream
//! connection drops, so routing a message to an absent id is a client
//! error, never a crash.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::{channel::mpsc, stream, SinkExt, Stream, StreamExt};
use rmcp::model::{ClientJsonRpcMessage, ServerJsonRpcMessage};
use rmcp::ServiceExt;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::mcp::server::ObsidianService;
use crate::mcp::transport::TransportError;

const MESSAGE_ENDPOINT: &str = "/messages";
const CHANNEL_CAPACITY: usize = 64;

/// Discovery document served at `GET /`.
#[derive(Debug, Clone, Serialize)]
struct Discovery {
    schema_version: &'static str,
    protocol: &'static str,
    server_name: &'static str,
    server_version: &'static str,
    description: &'static str,
}

const DISCOVERY: Discovery = Discovery {
    schema_version: "v1",
    protocol: "mcp",
    server_name: "Obsidian MCP",
    server_version: env!("CARGO_PKG_VERSION"),
    description: "MCP server for Obsidian interactions",
};

/// One live session: the inbound half of its channel pair, plus when it
/// opened. Exclusively owned by the hub's table.
struct SseSession {
    created_at: DateTime<Utc>,
    to_session: mpsc::Sender<ClientJsonRpcMessage>,
}

struct HubState {
    service: ObsidianService,
    sessions: Mutex<HashMap<String, SseSession>>,
}

/// The SSE transport hub: one axum surface, any number of sessions.
pub struct SseTransportHub {
    state: Arc<HubState>,
    shutdown: CancellationToken,
}

impl SseTransportHub {
    pub fn new(service: ObsidianService) -> Self {
        Self {
            state: Arc::new(HubState {
                service,
                sessions: Mutex::new(HashMap::new()),
            }),
            shutdown: CancellationToken::new(),
        }
    }

    /// The HTTP surface: discovery, the event-stream endpoint, and the
    /// message sink, all behind permissive CORS.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(discovery))
            .route("/sse", get(open_session))
            .route(MESSAGE_ENDPOINT, post(post_message))
            .layer(middleware::from_fn(cors))
            .with_state(self.state.clone())
    }

    /// Bind and serve until [`Self::shutdown`] is called. A bind failure is
    /// fatal to this transport instance.
    pub async fn serve(&self, addr: SocketAddr) -> Result<(), TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(TransportError::Bind)?;
        info!(%addr, "sse transport listening");
        let shutdown = self.shutdown.child_token();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(TransportError::Io)
    }

    /// Stop accepting connections and let open streams close.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn session_count(&self) -> usize {
        self.state
            .sessions
            .lock()
            .map(|sessions| sessions.len())
            .unwrap_or(0)
    }
}

async fn discovery() -> Json<Discovery> {
    debug!("received discovery request");
    Json(DISCOVERY)
}

/// Removes the session entry when the event stream drops. The owning
/// connection's close path is the only writer that deletes its key.
struct SessionGuard {
    hub: Arc<HubState>,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.hub.sessions.lock() {
            if let Some(session) = sessions.remove(&self.session_id) {
                let lifetime = Utc::now() - session.created_at;
                info!(
                    session_id = %self.session_id,
                    seconds = lifetime.num_seconds(),
                    "sse session closed"
                );
            }
        }
    }
}

async fn open_session(
    State(hub): State<Arc<HubState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let session_id = Uuid::new_v4().simple().to_string();
    let (to_session, from_client) = mpsc::channel::<ClientJsonRpcMessage>(CHANNEL_CAPACITY);
    let (to_client, outbound) = mpsc::channel::<ServerJsonRpcMessage>(CHANNEL_CAPACITY);

    if let Ok(mut sessions) = hub.sessions.lock() {
        sessions.insert(
            session_id.clone(),
            SseSession {
                created_at: Utc::now(),
                to_session,
            },
        );
    }
    info!(session_id = %session_id, "sse session opened");

    // One protocol service per session. It ends on its own when either
    // half of the channel pair closes; results of invocations whose
    // destination stream is gone are simply dropped with it.
    let service = hub.service.clone();
    let serve_id = session_id.clone();
    tokio::spawn(async move {
        match service.serve((to_client, from_client)).await {
            Ok(running) => {
                let _ = running.waiting().await;
            }
            Err(err) => {
                debug!(session_id = %serve_id, error = %err, "sse session ended during initialize");
            }
        }
    });

    let endpoint = format!("{MESSAGE_ENDPOINT}?sessionId={session_id}");
    let guard = SessionGuard {
        hub,
        session_id,
    };
    let frames = outbound.map(move |frame| {
        let _owner = &guard;
        Event::default().event("message").json_data(&frame)
    });

    Sse::new(
        stream::once(async move { Ok(Event::default().event("endpoint").data(endpoint)) })
            .chain(frames),
    )
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

async fn post_message(
    State(hub): State<Arc<HubState>>,
    Query(query): Query<MessageQuery>,
    Json(frame): Json<ClientJsonRpcMessage>,
) -> Response {
    let sender = hub
        .sessions
        .lock()
        .ok()
        .and_then(|sessions| sessions.get(&query.session_id).map(|s| s.to_session.clone()));

    let Some(mut sender) = sender else {
        warn!(session_id = %query.session_id, "no session found for sessionId");
        return (StatusCode::BAD_REQUEST, "No session found for sessionId").into_response();
    };

    match sender.send(frame).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(_) => {
            // The owning connection is tearing down; its guard removes the
            // table entry.
            warn!(session_id = %query.session_id, "session is no longer accepting messages");
            (StatusCode::BAD_REQUEST, "Session closed").into_response()
        }
    }
}

async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }
    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}
