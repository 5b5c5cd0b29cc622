//! MCP transports: process stdio and HTTP server-sent events

pub mod sse;
pub mod stdio;

use std::net::SocketAddr;

use thiserror::Error;

use crate::mcp::server::ObsidianService;

pub use sse::SseTransportHub;
pub use stdio::{SessionState, StdioTransportSession};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),
    #[error("transport terminated: {0}")]
    Io(#[source] std::io::Error),
    #[error("mcp handshake failed: {0}")]
    Handshake(String),
    #[error("session task failed: {0}")]
    Session(String),
}

/// Which channel carries MCP frames.
///
/// The two transports share only the service composition, not behavior, so
/// selection is a plain variant consumed by [`run`] rather than a trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Stdio,
    Sse(SocketAddr),
}

/// Serve the given service on the selected transport until it stops.
///
/// Establishment failures (stdio handshake, listener bind) are fatal and
/// surfaced to the caller; per-request errors never reach this level.
pub async fn run(service: ObsidianService, kind: TransportKind) -> Result<(), TransportError> {
    match kind {
        TransportKind::Stdio => {
            let mut session = StdioTransportSession::new(service);
            session.start().await?;
            session.wait().await
        }
        TransportKind::Sse(addr) => SseTransportHub::new(service).serve(addr).await,
    }
}
