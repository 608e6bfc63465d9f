//! pinhash CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pinhash_cli::cmd;
use pinhash_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries JSON; logs go to stderr
    let default_level = if cli.verbose { "pinhash_core=debug,warn" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Resolve { tool, input } => {
            let config = cli.resolver_config()?;
            cmd::resolve::resolve(&config, tool, input).await
        }
        Commands::Parse { command } => {
            cmd::parse::parse(&command.join(" "));
            Ok(())
        }
    }
}
