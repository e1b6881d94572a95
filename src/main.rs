use anyhow::{Context, Result};
use argh::FromArgs;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use expense_mcp::{Config, ExpenseMcpHandler, PostgrestStore, ToolExecutor};

#[derive(FromArgs)]
/// Expense tracker MCP server backed by Supabase
struct Args {
    /// print version and exit
    #[argh(switch, short = 'v')]
    version: bool,

    /// run in HTTP mode instead of stdio
    #[argh(switch)]
    http: bool,

    /// port for HTTP server (default: 3000)
    #[argh(option, short = 'p', default = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    if args.version {
        println!("expense-mcp {}", env!("EXPENSE_MCP_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .without_time()
        .init();

    let config = Config::from_env()?;
    info!("Using Supabase project at {}", config.supabase_url);

    let store = PostgrestStore::new(&config).context("Failed to create Supabase client")?;
    let handler = ExpenseMcpHandler::new(ToolExecutor::new(Arc::new(store)));

    info!("Server ready, starting main loop");
    if args.http {
        expense_mcp::run_rmcp_server_http(handler, args.port).await?;
    } else {
        expense_mcp::run_rmcp_server(handler).await?;
    }

    Ok(())
}
