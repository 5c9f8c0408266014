//! birthorder CLI - survey backend for birth-order research
//!
//! - `serve`: run the HTTP API
//! - `stats`: aggregate statistics straight from a storage backend
//! - `export`: dump every submission as CSV

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "birthorder",
    author,
    version,
    about = "Collect, aggregate and export birth-order survey submissions"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Print aggregate statistics as JSON
    Stats(commands::stats::StatsArgs),
    /// Export submissions as CSV
    Export(commands::export::ExportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args).await?,
        Commands::Stats(args) => commands::stats::run_stats(args).await?,
        Commands::Export(args) => commands::export::run_export(args).await?,
    }

    Ok(())
}
