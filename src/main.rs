//! mcp-agent-tools CLI binary entry point.

use clap::Parser;
use mcp_agent_tools::cli::{commands, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => match &cli.command {
            Commands::Servers => commands::handle_servers(&config).await,
            Commands::Tools(args) => commands::handle_tools(&config, args).await,
            Commands::Call(args) => commands::handle_call(&config, args).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
