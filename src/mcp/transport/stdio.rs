//! Single-session MCP transport over process stdio

use rmcp::{service::RunningService, RoleServer, ServiceExt};
use tokio::io::{stdin, stdout, AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::mcp::server::ObsidianService;
use crate::mcp::transport::TransportError;

/// Lifecycle of the stdio session. `Connecting` only exists while the MCP
/// handshake is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Running,
    Stopped,
}

/// The one MCP session a stdio process carries. There is no session table:
/// the process boundary is the session boundary, and the peer's pipelined
/// requests are correlated by the protocol layer's request ids.
pub struct StdioTransportSession {
    service: ObsidianService,
    state: SessionState,
    running: Option<RunningService<RoleServer, ObsidianService>>,
}

impl StdioTransportSession {
    pub fn new(service: ObsidianService) -> Self {
        Self {
            service,
            state: SessionState::Idle,
            running: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Bind the service to this process's stdin/stdout.
    pub async fn start(&mut self) -> Result<(), TransportError> {
        self.start_on(stdin(), stdout()).await
    }

    /// Bind the service to an arbitrary duplex pair. Starting an already
    /// running session is a warning no-op; a failed handshake is fatal to
    /// the session (stdio has no reconnect concept).
    pub async fn start_on<R, W>(&mut self, reader: R, writer: W) -> Result<(), TransportError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        if self.state == SessionState::Running {
            warn!("stdio transport is already running");
            return Ok(());
        }

        self.state = SessionState::Connecting;
        match self.service.clone().serve((reader, writer)).await {
            Ok(running) => {
                self.running = Some(running);
                self.state = SessionState::Running;
                info!("stdio transport started");
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Stopped;
                Err(TransportError::Handshake(err.to_string()))
            }
        }
    }

    /// Block until the peer closes the stream or the session is cancelled.
    pub async fn wait(&mut self) -> Result<(), TransportError> {
        if let Some(running) = self.running.take() {
            running
                .waiting()
                .await
                .map_err(|err| TransportError::Session(err.to_string()))?;
            self.state = SessionState::Stopped;
            info!("stdio transport stopped");
        }
        Ok(())
    }

    /// Cancel the running session; a no-op when nothing is running.
    pub async fn stop(&mut self) {
        match self.running.take() {
            Some(running) => {
                if let Err(err) = running.cancel().await {
                    warn!(error = %err, "stdio transport did not stop cleanly");
                }
                self.state = SessionState::Stopped;
                info!("stdio transport stopped");
            }
            None => debug!("stop requested but the stdio transport is not running"),
        }
    }
}
