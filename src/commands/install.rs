use colored::Colorize;

pub fn run() {
    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "obsidian-mcp".to_string());

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Requires the Obsidian Local REST API plugin; copy its API key first.");
    println!();
    println!(
        "{}",
        "For Claude Desktop (~/.config/claude/claude_desktop_config.json):".dimmed()
    );
    println!(
        r#"{{
  "mcpServers": {{
    "obsidian": {{
      "command": "{}",
      "args": ["serve"],
      "env": {{
        "OBSIDIAN_API_KEY": "<your API key>",
        "OBSIDIAN_BASE_URL": "https://127.0.0.1:27124"
      }}
    }}
  }}
}}"#,
        binary_path
    );
    println!();
    println!(
        "{}",
        "For SSE clients, run the HTTP transport instead:".dimmed()
    );
    println!("  {binary_path} serve --transport sse --port 3000");
    println!();
    println!("{}", "Available tools:".bold());
    println!(
        "  • {} - Get status information from Obsidian",
        "obsidian_get_status".green()
    );
    println!(
        "  • {} - Read and write the active file, vault files, and periodic notes",
        "obsidian_get_file".green()
    );
    println!(
        "  • {} - Full-text and structured search across the vault",
        "obsidian_search".green()
    );
    println!(
        "  • {} - List and execute Obsidian commands",
        "obsidian_execute_command".green()
    );
    println!();
    println!("Run `obsidian-mcp tools` for the full catalog.");
}
