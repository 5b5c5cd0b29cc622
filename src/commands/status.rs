use anyhow::{bail, Result};
use colored::Colorize;

use obsidian_mcp::core::client::{Payload, VaultClient};
use obsidian_mcp::core::config::ServerConfig;

pub fn run(json: bool) -> Result<()> {
    let config = ServerConfig::resolve(None, None, None)?;
    let client = VaultClient::new(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let response = runtime.block_on(client.get_status());

    if let Some(failure) = &response.error {
        bail!(
            "vault is unreachable at {}: {} {}",
            config.base_url,
            failure.status,
            failure.status_text
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", "Obsidian vault is reachable".green().bold());
    println!("  endpoint: {}", config.base_url);
    if let Some(Payload::Json(status)) = &response.data {
        if let Some(authenticated) = status.get("authenticated") {
            println!("  authenticated: {authenticated}");
        }
        if let Some(versions) = status.get("versions") {
            println!("  versions: {versions}");
        }
    }
    Ok(())
}
