//! Core vault access: configuration and the Local REST API client

pub mod client;
pub mod config;

pub use client::{VaultClient, VaultResponse};
pub use config::ServerConfig;
