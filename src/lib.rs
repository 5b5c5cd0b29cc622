//! obsidian-mcp library
//!
//! MCP server fronting the Obsidian Local REST API.
//!
//! # Modules
//!
//! - `core`: configuration and the vault REST client
//! - `mcp`: tool catalog, response formatting, and the stdio/SSE transports

pub mod core;
pub mod mcp;

// Re-exports for convenience
pub use crate::core::client::{VaultClient, VaultResponse};
pub use crate::core::config::ServerConfig;
pub use crate::mcp::server::ObsidianService;
pub use crate::mcp::transport::{TransportError, TransportKind};
