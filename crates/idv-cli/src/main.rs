//! # idv CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// IDV Stack CLI — identification flow driver.
///
/// Drives the verification flow orchestrator in the terminal against a
/// scripted in-process service, and inspects persisted flow stores.
#[derive(Parser, Debug)]
#[command(name = "idv", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run a verification flow in the terminal.
    Run(idv_cli::run::RunArgs),
    /// Inspect or clear a persisted flow store.
    Store(idv_cli::store::StoreArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => idv_cli::run::run(args).await,
        Commands::Store(args) => idv_cli::store::run(args),
    }
}
