use anyhow::Result;
use clap::Parser;
use excel_mcp::config::{CliArgs, ServerConfig};
use excel_mcp::server::ExcelServer;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = Arc::new(ServerConfig::from_args(args)?);

    tracing::info!("starting excel-mcp stdio server");
    ExcelServer::new(config).run_stdio().await
}
