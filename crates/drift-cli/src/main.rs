mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Discover { provider, regions, resource_types } => {
            commands::discover(provider, regions, resource_types, cli.remote, cli.token).await
        }
        Command::Drift { provider, region, state_path, mode } => {
            commands::drift(provider, region, state_path, mode, cli.remote, cli.token).await
        }
        Command::Graph { output } => commands::graph(output, cli.remote, cli.token).await,
        Command::Status => commands::status(cli.remote, cli.token).await,
        Command::Cache { command } => commands::cache(command, cli.remote, cli.token).await,
    }
}
