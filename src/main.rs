mod client;
mod config;
mod error;
mod mcp;
mod models;
mod rate_limit;
mod tools;

use anyhow::Result;
use client::HnClient;
use config::Config;
use mcp::McpServer;
use std::sync::Arc;
use tools::ToolRegistry;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Startup can fail before the logger is installed
        if log::max_level() == log::LevelFilter::Off {
            eprintln!("Fatal: {:#}", e);
        } else {
            log::error!("Fatal: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging (stderr; stdout carries protocol frames)
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    pretty_env_logger::formatted_builder().parse_filters(&filters).init();
    log::info!("Starting {} v{}...", config.server.name, config.server.version);
    log::info!(
        "Configuration loaded: api={} search={} min_interval={}ms",
        config.hacker_news.api_base,
        config.hacker_news.search_base,
        config.rate_limit.min_interval_ms
    );

    // One client, and so one rate limiter, for every tool
    let client = HnClient::new(&config)?;
    let registry = ToolRegistry::standard(client, &config);

    let server = Arc::new(McpServer::new(registry, config.server.clone()));
    log::info!("MCP server listening on stdio");

    server.serve_stdio().await?;

    log::info!("Server stopped");
    Ok(())
}
