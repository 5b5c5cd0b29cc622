mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::serve::TransportArg;

#[derive(Parser)]
#[command(name = "obsidian-mcp")]
#[command(about = "MCP server for an Obsidian vault via the Local REST API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the MCP tool catalog over stdio or SSE
    Serve {
        #[arg(long, value_enum, help = "Transport to serve on (overrides SERVER_TYPE)")]
        transport: Option<TransportArg>,
        #[arg(long, help = "Obsidian Local REST API base URL (overrides OBSIDIAN_BASE_URL)")]
        base_url: Option<String>,
        #[arg(long, help = "Obsidian API key (overrides OBSIDIAN_API_KEY)")]
        api_key: Option<String>,
        #[arg(long, help = "Listen port for the SSE transport (overrides PORT)")]
        port: Option<u16>,
    },
    /// Check that the Obsidian REST API is reachable
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List the tools this server exposes
    Tools {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show MCP client configuration instructions
    Install,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            transport,
            base_url,
            api_key,
            port,
        } => commands::serve::run(transport, base_url, api_key, port),
        Commands::Status { json } => commands::status::run(json),
        Commands::Tools { json } => commands::tools::run(json),
        Commands::Install => {
            commands::install::run();
            Ok(())
        }
    }
}

// stdout carries MCP frames on the stdio transport; diagnostics go to stderr.
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
