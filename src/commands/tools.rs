use anyhow::Result;
use colored::Colorize;

use obsidian_mcp::mcp::ObsidianService;

pub fn run(json: bool) -> Result<()> {
    let tools = ObsidianService::catalog();

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("{}", format!("{} tools registered", tools.len()).bold());
    for tool in &tools {
        println!(
            "  • {} - {}",
            tool.name.green(),
            tool.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
