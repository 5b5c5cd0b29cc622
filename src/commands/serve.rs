use std::env;
use std::net::SocketAddr;

use anyhow::Result;
use clap::ValueEnum;
use tracing::warn;

use obsidian_mcp::core::client::VaultClient;
use obsidian_mcp::core::config::{ServerConfig, SERVER_TYPE_VAR};
use obsidian_mcp::mcp::{self, ObsidianService, TransportKind};

/// Transport selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    Stdio,
    Sse,
}

pub fn run(
    transport: Option<TransportArg>,
    base_url: Option<String>,
    api_key: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let config = ServerConfig::resolve(base_url, api_key, port)?;
    let kind = resolve_transport(transport, &config);
    let client = VaultClient::new(&config)?;
    let service = ObsidianService::new(client);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run(service, kind))?;
    Ok(())
}

fn resolve_transport(arg: Option<TransportArg>, config: &ServerConfig) -> TransportKind {
    let arg = arg.or_else(|| match env::var(SERVER_TYPE_VAR).ok().as_deref() {
        Some("sse") => Some(TransportArg::Sse),
        Some("stdio") | None => None,
        Some(other) => {
            warn!(server_type = other, "unknown SERVER_TYPE, defaulting to stdio");
            None
        }
    });

    match arg.unwrap_or(TransportArg::Stdio) {
        TransportArg::Stdio => TransportKind::Stdio,
        TransportArg::Sse => TransportKind::Sse(SocketAddr::from(([0, 0, 0, 0], config.port))),
    }
}
